use crate::error::CoreResult;
use crate::voting::tally::VoteTally;

pub fn render_tally_csv(tally: &VoteTally) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new().from_writer(vec![]);
    wtr.write_record([
        "item_id",
        "title",
        "true_votes",
        "fake_votes",
        "true_percent",
        "fake_percent",
    ])?;
    // items() is already in id order
    for item in tally.items() {
        let pct = item.percentages();
        wtr.write_record([
            item.id.to_string(),
            item.title.clone(),
            item.true_count.to_string(),
            item.fake_count.to_string(),
            pct.true_percent.to_string(),
            pct.fake_percent.to_string(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).replace("\r\n", "\n"))
}
