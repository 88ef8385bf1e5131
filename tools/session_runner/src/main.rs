use newscheck_core::clock::SystemClock;
use newscheck_core::config::AppConfig;
use newscheck_core::pipeline::scheduler::TimerQueue;
use newscheck_core::session::board::BreakingNewsBoard;
use newscheck_core::session::check::NewsCheckSession;
use newscheck_core::voting::item::{VoteChoice, VoterHandle};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    // session_runner [config.json|-] [dwell_ms] [audit_out.ndjson]
    //
    // Plays one screenshot check against real time, then a few breaking-news
    // votes, and prints notifications and the tally CSV. The check session's audit
    // trail is written to audit_out when given.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut cfg = match args.get(1).filter(|a| a.as_str() != "-") {
        Some(path) => AppConfig::load(path).unwrap_or_else(|e| {
            eprintln!("config error: {}", e);
            std::process::exit(2);
        }),
        None => AppConfig::default(),
    };
    if let Some(ms) = args.get(2) {
        cfg.simulator.dwell_ms = ms.parse().unwrap_or_else(|_| {
            eprintln!("invalid dwell_ms: {}", ms);
            std::process::exit(2);
        });
    }

    let mut check = NewsCheckSession::new(&cfg, SystemClock).expect("session");
    let mut queue = TimerQueue::new();
    let platform = cfg.platforms[0].value.clone();
    check.select_platform(&platform).expect("platform");
    let uploaded = check
        .attach_screenshot("screenshot.png", 64 * 1024)
        .expect("screenshot");
    info!(notice = uploaded.title(), "screenshot attached");

    let run = check.start_analysis(&mut queue).expect("start analysis");
    info!(run = %run.token(), "analysis started");

    // Host event loop: sleep until the next deadline, then deliver due timers.
    let origin = Instant::now();
    while let Some(due) = queue.next_due() {
        let elapsed = origin.elapsed();
        if due > elapsed {
            std::thread::sleep(due - elapsed);
        }
        let step = queue.now();
        for notice in check
            .advance_by(&mut queue, due.saturating_sub(step))
            .expect("advance")
        {
            println!("NOTICE {} | {}", notice.title(), notice.description());
        }
        for s in check.steps() {
            info!(step = s.id, label = %s.label, status = ?s.status, "step");
        }
    }

    for n in check.notifications().newest_first() {
        println!(
            "NOTIFICATION {} {} {:?} {} | {}",
            n.id, n.subject_label, n.status, n.created_at_display, n.message
        );
    }

    let mut board = BreakingNewsBoard::from_config(&cfg, SystemClock).expect("board");
    let voters: Vec<VoterHandle> = (0..3).map(|_| VoterHandle::anonymous()).collect();
    let script = [
        (0usize, 1u32, VoteChoice::True),
        (1, 1, VoteChoice::Fake),
        (2, 1, VoteChoice::Fake),
        (0, 2, VoteChoice::Fake),
        (0, 2, VoteChoice::True),
        (1, 3, VoteChoice::True),
        (1, 3, VoteChoice::True),
    ];
    for (v, item, choice) in script {
        if let Ok((outcome, notice)) = board.vote(&voters[v], item, choice) {
            let pct = outcome.percentages();
            println!(
                "VOTE item={} {} true={} ({}%) fake={} ({}%)",
                item,
                notice.title(),
                outcome.true_count,
                pct.true_percent,
                outcome.fake_count,
                pct.fake_percent
            );
        }
    }
    print!("{}", board.export_csv().expect("tally csv"));

    info!(
        check_events = check.audit().len(),
        board_events = board.audit().len(),
        "audit trails recorded"
    );
    if let Some(out) = args.get(3) {
        let file = std::fs::File::create(out).expect("create audit output");
        check.audit().write_ndjson(file).expect("write audit ndjson");
        info!(path = %out, "check session audit written");
    }
}
