use newscheck_core::audit::log::verify_ndjson;
use std::fs::File;
use std::io::BufReader;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: audit_verifier <path/to/audit.ndjson>");
        std::process::exit(2);
    }
    let path = std::path::Path::new(&args[1]);
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open {}: {}", path.display(), e);
            std::process::exit(2);
        }
    };

    match verify_ndjson(BufReader::new(file)) {
        Ok(summary) => {
            let report = serde_json::json!({
                "result": "PASS",
                "events": summary.events,
                "last_hash": summary.last_hash,
            });
            println!("{}", report);
            std::process::exit(0);
        }
        Err(e) => {
            let report = serde_json::json!({"result": "FAIL", "reason": e.to_string()});
            println!("{}", report);
            std::process::exit(1);
        }
    }
}
