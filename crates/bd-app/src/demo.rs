//! Demo mode: an in-memory source preloaded with generated CSV files

use bd_data::{MemorySource, Result};

const REGIONS: [&str; 4] = ["north", "south", "east", "west"];
const CHANNELS: [&str; 3] = ["online", "retail", "partner"];
const ANSWERS: [&str; 5] = ["very unhappy", "unhappy", "neutral", "happy", "very happy"];

/// Sales ledger with a few missing amounts
fn sales_csv(rows: usize) -> String {
    let mut csv = String::from("order_id,region,channel,amount,currency\n");
    for i in 0..rows {
        let amount = if i % 7 == 3 {
            String::new()
        } else {
            format!("{:.2}", 10.0 + (i * 37 % 250) as f64 * 1.5)
        };
        csv.push_str(&format!(
            "{},{},{},{},EUR\n",
            1000 + i,
            REGIONS[i % REGIONS.len()],
            CHANNELS[(i / 2) % CHANNELS.len()],
            amount
        ));
    }
    csv
}

/// Survey answers with free-text comments
fn survey_csv(rows: usize) -> String {
    let mut csv = String::from("respondent,answer,age_group,comment\n");
    for i in 0..rows {
        let comment = match i % 4 {
            0 => format!("comment number {}", i),
            1 => "N/A".to_string(),
            _ => String::new(),
        };
        csv.push_str(&format!(
            "r{:03},{},{}0s,{}\n",
            i,
            ANSWERS[(i * 3) % ANSWERS.len()],
            2 + i % 5,
            comment
        ));
    }
    csv
}

/// Build the demo source
pub fn demo_source() -> Result<MemorySource> {
    let source = MemorySource::new("demo");
    source.ingest("sales.csv", sales_csv(57).as_bytes())?;
    source.ingest("survey.csv", survey_csv(24).as_bytes())?;
    Ok(source)
}
