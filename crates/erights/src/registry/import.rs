use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::Shareholder;

/// One row of the registrar's register export. `holdings_after` may be
/// blank in older exports, in which case it is derived at import time.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareholderRecord {
    #[serde(rename = "Reg Account Number")]
    pub reg_account_number: String,
    #[serde(rename = "CHN", default, deserialize_with = "empty_string_as_none")]
    pub chn: Option<String>,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Holdings")]
    pub holdings: i64,
    #[serde(rename = "Rights Issue")]
    pub rights_issue: i64,
    #[serde(rename = "Holdings After", default)]
    pub holdings_after: Option<i64>,
}

impl ShareholderRecord {
    pub fn into_shareholder(self, id: i64) -> Shareholder {
        let holdings_after = self
            .holdings_after
            .unwrap_or(self.holdings + self.rights_issue);
        Shareholder {
            id,
            reg_account_number: self.reg_account_number,
            chn: self.chn,
            name: self.name,
            holdings: self.holdings,
            rights_issue: self.rights_issue,
            holdings_after,
        }
    }
}

pub fn load_from_reader<R: Read>(reader: R) -> Result<Vec<ShareholderRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<ShareholderRecord>() {
        records.push(record?);
    }

    Ok(records)
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ShareholderRecord>, csv::Error> {
    let file = File::open(path)?;
    load_from_reader(file)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.is_empty()))
}
