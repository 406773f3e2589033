/// Registry key of a dataset source.
/// Examples: `leetcode`, `apps`, `codesearchnet`
pub type SourceKey = String;
/// Human-readable origin dataset name stamped into the `source` column.
/// Examples: `LeetCodeDataset`, `APPS`
pub type SourceName = String;
/// Partition label of an origin dataset.
/// Examples: `train`, `test`, `validation`
pub type SplitName = String;
/// Hex-encoded SHA-256 identity digest over `(source, title, prompt)`.
/// Example: `9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08`
pub type IdentityKey = String;
/// Remote storage object key.
/// Example: `corpus/data/clean/_union/sample_50.csv`
pub type ObjectKey = String;
/// External dataset locator understood by the acquisition backend.
/// Example: `newfacade/LeetCodeDataset`
pub type DatasetLocator = String;
