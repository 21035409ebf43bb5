use std::io::{self, Write};

use serde::Serialize;

use crate::domain::Book;
use crate::filter::FilterDomain;
use crate::session::{LoadStatus, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Serialize)]
pub struct BrowseResult {
    pub status: LoadStatus,
    pub matched: usize,
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct DomainsResult {
    pub status: LoadStatus,
    pub domains: FilterDomain,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_browse(result: &BrowseResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_domains(result: &DomainsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}
