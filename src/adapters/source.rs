use crate::domain::model::RawCallRecord;
use crate::utils::error::{Result, SchedulerError};
use std::fs::File;
use std::path::Path;

/// 以串流方式逐列讀取通話預測 CSV（只能讀一次）
pub struct CsvRecordSource {
    records: csv::DeserializeRecordsIntoIter<File, RawCallRecord>,
}

impl CsvRecordSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SchedulerError::InputUnavailable {
            path: path.display().to_string(),
            source,
        })?;

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(file);

        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl Iterator for CsvRecordSource {
    type Item = Result<RawCallRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| record.map_err(SchedulerError::from))
    }
}
