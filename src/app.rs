use log::{debug, info, warn};

use quota_allocation::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::app::config_reader::*;

#[derive(Debug, Snafu)]
pub enum QuotaError {
    #[snafu(display("Error opening JSON file"))]
    OpeningJson { source: std::io::Error },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a JSON number or a numeric string"))]
    ParsingJsonNumber {},
    #[snafu(display("The config path has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("CSV line {lineno} does not carry a nonnegative integer count"))]
    CsvCountParse { lineno: usize },
    #[snafu(display("Error writing the summary"))]
    WritingSummary { source: std::io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type QuotaResult<T> = Result<T, QuotaError>;

pub mod config_reader {
    use serde::{Deserialize, Serialize};
    use serde_json::Value as JSValue;
    use snafu::prelude::*;

    use crate::app::{OpeningJsonSnafu, ParsingJsonNumberSnafu, ParsingJsonSnafu, QuotaResult};

    /// A unit given inline in the configuration. The identifier may be
    /// omitted, in which case the position in the list is used.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ConfigUnit {
        pub id: Option<String>,
        pub name: String,
        pub count: u64,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct FileSource {
        pub provider: String,
        #[serde(rename = "filePath")]
        pub file_path: String,
        #[serde(rename = "nameColumnIndex")]
        _name_column_index: Option<JSValue>,
        #[serde(rename = "countColumnIndex")]
        _count_column_index: Option<JSValue>,
        #[serde(rename = "idColumnIndex")]
        _id_column_index: Option<JSValue>,
        #[serde(rename = "firstRowIndex")]
        _first_row_index: Option<JSValue>,
    }

    impl FileSource {
        pub fn name_column_index(&self) -> QuotaResult<usize> {
            Ok(read_js_index(&self._name_column_index, 1)? - 1)
        }

        pub fn count_column_index(&self) -> QuotaResult<usize> {
            Ok(read_js_index(&self._count_column_index, 2)? - 1)
        }

        pub fn id_column_index(&self) -> QuotaResult<Option<usize>> {
            match &self._id_column_index {
                None => Ok(None),
                x => Ok(Some(read_js_index(x, 1)? - 1)),
            }
        }

        pub fn first_row_index(&self) -> QuotaResult<usize> {
            read_js_index(&self._first_row_index, 1)
        }
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct QuotaConfig {
        pub title: Option<String>,
        #[serde(rename = "totalLimit")]
        _total_limit: JSValue,
        pub units: Option<Vec<ConfigUnit>>,
        #[serde(rename = "unitFileSources")]
        pub unit_file_sources: Option<Vec<FileSource>>,
    }

    impl QuotaConfig {
        pub fn total_limit(&self) -> QuotaResult<i64> {
            read_js_i64(&self._total_limit)
        }
    }

    /// The echo of the configuration in the output summary.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct OutputConfig {
        pub title: Option<String>,
        #[serde(rename = "totalLimit")]
        pub total_limit: String,
    }

    pub fn read_summary(path: String) -> QuotaResult<JSValue> {
        let contents = std::fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        log::debug!("read_summary: {:?}", js);
        Ok(js)
    }

    // The limit may be given as a JSON number or as a numeric string.
    fn read_js_i64(x: &JSValue) -> QuotaResult<i64> {
        match x {
            JSValue::Number(n) => n.as_i64().context(ParsingJsonNumberSnafu {}),
            JSValue::String(s) => s.parse::<i64>().ok().context(ParsingJsonNumberSnafu {}),
            _ => None.context(ParsingJsonNumberSnafu {}),
        }
    }

    // 1-based column and row indices, following spreadsheet conventions.
    fn read_js_index(x: &Option<JSValue>, default: usize) -> QuotaResult<usize> {
        let v = match x {
            None => default,
            Some(JSValue::Number(n)) => n
                .as_u64()
                .map(|x| x as usize)
                .context(ParsingJsonNumberSnafu {})?,
            Some(JSValue::String(s)) => {
                s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {})?
            }
            _ => return None.context(ParsingJsonNumberSnafu {}),
        };
        if v >= 1 {
            Ok(v)
        } else {
            None.context(ParsingJsonNumberSnafu {})
        }
    }
}

/// A unit as parsed by the readers, before validation of identifiers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedUnit {
    pub id: String,
    pub name: String,
    pub count: u64,
}

pub mod csv_reader {
    use log::debug;
    use snafu::prelude::*;
    use std::fs::File;

    use crate::app::config_reader::FileSource;
    use crate::app::{
        CsvCountParseSnafu, CsvLineParseSnafu, CsvLineTooShortSnafu, CsvOpenSnafu, ParsedUnit,
        QuotaResult,
    };

    pub fn read_csv_units(path: String, cfs: &FileSource) -> QuotaResult<Vec<ParsedUnit>> {
        let default_id = make_default_id(&path);

        let name_idx = cfs.name_column_index()?;
        let count_idx = cfs.count_column_index()?;
        let id_idx_o = cfs.id_column_index()?;

        let mut res: Vec<ParsedUnit> = Vec::new();
        let (records, row_offset) = get_records(&path, cfs)?;

        for (idx, line_r) in records.enumerate() {
            let lineno = idx + row_offset;
            let line = line_r.context(CsvLineParseSnafu { lineno })?;
            debug!("read_csv_units: lineno: {:?} row: {:?}", lineno, line);

            let id = if let Some(id_idx) = id_idx_o {
                line.get(id_idx)
                    .context(CsvLineTooShortSnafu { lineno })?
                    .trim()
                    .to_string()
            } else {
                default_id(lineno)
            };
            let name = line
                .get(name_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .to_string();
            let count = line
                .get(count_idx)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim()
                .parse::<u64>()
                .ok()
                .context(CsvCountParseSnafu { lineno })?;

            res.push(ParsedUnit { id, name, count });
        }
        Ok(res)
    }

    fn get_records(
        path: &String,
        cfs: &FileSource,
    ) -> QuotaResult<(csv::StringRecordsIntoIter<File>, usize)> {
        let first_row = cfs.first_row_index()?;
        let rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .context(CsvOpenSnafu { path: path.clone() })?;
        let mut records = rdr.into_records();
        // The index starts at 1 to respect most conventions in the excel world
        for _ in 1..first_row {
            _ = records.next();
        }
        Ok((records, first_row))
    }

    fn make_default_id(path: &String) -> impl Fn(usize) -> String {
        let simplified_file_name = simplify_file_name(path.as_str());
        move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
    }

    fn simplify_file_name(path: &str) -> String {
        let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
        match base.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => base.to_string(),
        }
    }
}

fn validate_units(parsed: &[ParsedUnit]) -> QuotaResult<Vec<Unit>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut res: Vec<Unit> = Vec::new();
    for pu in parsed.iter() {
        if !seen.insert(pu.id.clone()) {
            whatever!("Duplicate unit id {:?}", pu.id);
        }
        res.push(Unit {
            id: pu.id.clone(),
            name: pu.name.clone(),
            count: pu.count,
        });
    }
    Ok(res)
}

fn allocations_to_json(res: &CalculationResult) -> Vec<JSValue> {
    // Rows come out in input order and are reported in that order.
    res.data
        .iter()
        .map(|row| {
            json!({
                "id": row.unit.id,
                "name": row.unit.name,
                "count": row.unit.count.to_string(),
                "allocated": row.allocated.to_string(),
                "reduction": row.reduction.to_string(),
            })
        })
        .collect()
}

fn build_summary_js(config: &QuotaConfig, res: &CalculationResult) -> QuotaResult<JSValue> {
    let c = OutputConfig {
        title: config.title.clone(),
        total_limit: config.total_limit()?.to_string(),
    };
    Ok(json!({
        "config": c,
        "summary": {
            "totalSignup": res.total_signup.to_string(),
            "totalAllocated": res.total_allocated.to_string(),
            "excess": res.excess.to_string(),
            "isOver": res.is_over,
        },
        "allocations": allocations_to_json(res),
    }))
}

fn read_unit_data(root_path: &Path, cfs: &FileSource) -> QuotaResult<Vec<ParsedUnit>> {
    let p: PathBuf = root_path.join(cfs.file_path.as_str());
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read unit file {:?}", p2);
    match cfs.provider.as_str() {
        "csv" => csv_reader::read_csv_units(p2, cfs),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn run_with_config(
    root_path: &Path,
    config: &QuotaConfig,
    check_summary_path: Option<String>,
    out_path: Option<String>,
) -> QuotaResult<()> {
    let total_limit = config.total_limit()?;

    let mut parsed: Vec<ParsedUnit> = Vec::new();
    if let Some(inline_units) = &config.units {
        for (idx, cu) in inline_units.iter().enumerate() {
            parsed.push(ParsedUnit {
                id: cu.id.clone().unwrap_or_else(|| format!("{}", idx + 1)),
                name: cu.name.clone(),
                count: cu.count,
            });
        }
    }
    for cfs in config.unit_file_sources.clone().unwrap_or_default() {
        let mut file_units = read_unit_data(root_path, &cfs)?;
        parsed.append(&mut file_units);
    }

    let units = validate_units(&parsed)?;
    info!("units: {:?}", units);

    let res = run_allocation(&units, total_limit);
    debug!("res {:?}", res);

    // Assemble the final json
    let result_js = build_summary_js(config, &res)?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    println!("summary:{}", pretty_js_stats);

    match out_path {
        Some(p) if p != "stdout" => {
            fs::write(p, pretty_js_stats.as_str()).context(WritingSummarySnafu {})?;
        }
        _ => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        info!("summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

pub fn run_quota(
    config_path: String,
    check_summary_path: Option<String>,
    out_path: Option<String>,
) -> QuotaResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config_str = fs::read_to_string(config_path.clone()).context(OpeningJsonSnafu {})?;
    let config: QuotaConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    run_with_config(root_p, &config, check_summary_path, out_path)
}

/// Runs directly from a CSV file of name,count rows, without a config file.
pub fn run_quota_csv(
    input_path: String,
    total_limit: i64,
    check_summary_path: Option<String>,
    out_path: Option<String>,
) -> QuotaResult<()> {
    let config_js = json!({
        "totalLimit": total_limit,
        "unitFileSources": [ { "provider": "csv", "filePath": input_path } ]
    });
    let config: QuotaConfig = serde_json::from_value(config_js).context(ParsingJsonSnafu {})?;
    run_with_config(Path::new("."), &config, check_summary_path, out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::ErrorCompat;

    fn demos_dir() -> String {
        format!("{}/demos", env!("CARGO_MANIFEST_DIR"))
    }

    fn run_allocation_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
        info!("Running test {}", test_name);
        let res = run_quota(
            format!("{}/{}/{}", demos_dir(), test_name, config_lpath),
            Some(format!("{}/{}/{}", demos_dir(), test_name, summary_lpath)),
            None,
        );
        if let Err(e) = &res {
            warn!("Error occured {:?}", e);
            eprintln!("An error occured {}", e);
            if let Some(bt) = ErrorCompat::backtrace(e) {
                eprintln!("trace: {}", bt);
            }
        }
        assert!(res.is_ok(), "test {} failed", test_name);
    }

    fn test_wrapper(test_name: &str) {
        run_allocation_test(
            test_name,
            format!("{}_config.json", test_name).as_str(),
            format!("{}_expected_summary.json", test_name).as_str(),
        )
    }

    #[test]
    fn over_subscribed() {
        test_wrapper("over_subscribed");
    }

    #[test]
    fn csv_units() {
        test_wrapper("csv_units");
    }

    #[test]
    fn within_limit() {
        test_wrapper("within_limit");
    }

    #[test]
    fn zero_limit() {
        test_wrapper("zero_limit");
    }

    #[test]
    fn duplicate_unit_id_rejected() {
        let res = run_quota(
            format!("{}/duplicate_id/duplicate_id_config.json", demos_dir()),
            None,
            None,
        );
        assert!(res.is_err());
    }

    #[test]
    fn reference_mismatch_detected() {
        let res = run_quota(
            format!("{}/over_subscribed/over_subscribed_config.json", demos_dir()),
            Some(format!(
                "{}/zero_limit/zero_limit_expected_summary.json",
                demos_dir()
            )),
            None,
        );
        assert!(res.is_err());
    }
}
