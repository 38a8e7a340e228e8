#![allow(dead_code)]

use periodsim::adapters::history_log_adapter::HistoryLogAdapter;
use periodsim::ports::log_port::LogLevel;
use std::io::Write;
use tempfile::NamedTempFile;

pub const GROWTH_DATA: &str = "\
LATA 2024_01 2024_02 2024_03
capital 100 200
growthRate 0.1
";

/// Expected totalSavings: [151, 262, 353].
pub const SAVINGS_DATA: &str = "\
LATA 2024_01 2024_02 2024_03
monthlyIncome 1000
savingFraction 0.1
ethereumDollar 10 20 15
ETHquantity 1 1 2
bankDeposit 100
bankDepositRate 0.01
initialSavings 50 0
";

pub fn write_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn messages(log: &HistoryLogAdapter, level: LogLevel) -> Vec<String> {
    log.entries()
        .into_iter()
        .filter(|e| e.level == level)
        .map(|e| e.message)
        .collect()
}
