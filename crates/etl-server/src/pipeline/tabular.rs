//! Tabular enrichment: descriptive statistics over a CSV file with a header row
//!
//! A column is numeric when every present value parses as a number, otherwise
//! it is categorical. Numeric columns report `count, mean, std, min, 25%, 50%,
//! 75%, max`; categorical columns report `count, unique, top, freq`. When both
//! kinds appear in one file every column carries the union of statistic names
//! and anything undefined for a column is `""`.

use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::content::AssetProcessingError;

/// Cell values read as missing
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const NUMERIC_STATS: &[&str] = &["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
const CATEGORICAL_STATS: &[&str] = &["count", "unique", "top", "freq"];
const ALL_STATS: &[&str] = &[
    "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max",
];

/// Summarize delimited bytes into `rows`, `cols` and `summary`
pub fn summarize(bytes: &[u8]) -> Result<Map<String, Value>, AssetProcessingError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = unique_headers(reader.headers()?);
    if headers.is_empty() {
        return Err(AssetProcessingError::MissingHeader);
    }

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows = 0usize;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(AssetProcessingError::RaggedRow {
                // header is line 1
                line: index + 2,
                expected: headers.len(),
                found: record.len(),
            });
        }

        for (column, values) in columns.iter_mut().enumerate() {
            if let Some(cell) = record.get(column).map(str::trim) {
                if !MISSING_MARKERS.contains(&cell) {
                    values.push(cell.to_string());
                }
            }
        }
        rows += 1;
    }

    let described: Vec<Described> = columns.iter().map(|values| describe(values)).collect();
    let has_numeric = described.iter().any(|d| matches!(d, Described::Numeric(_)));
    let has_categorical = described.iter().any(|d| matches!(d, Described::Categorical(_)));
    let stat_names = match (has_numeric, has_categorical) {
        (true, true) => ALL_STATS,
        (true, false) => NUMERIC_STATS,
        _ => CATEGORICAL_STATS,
    };

    let mut summary = Map::new();
    for (name, described) in headers.iter().zip(&described) {
        let stats = described.to_map();
        let column: Map<String, Value> = stat_names
            .iter()
            .map(|stat| {
                let value = stats.get(*stat).cloned().unwrap_or_else(|| json!(""));
                (stat.to_string(), value)
            })
            .collect();
        summary.insert(name.clone(), Value::Object(column));
    }

    let mut metadata = Map::new();
    metadata.insert("rows".to_string(), json!(rows));
    metadata.insert("cols".to_string(), json!(headers.len()));
    metadata.insert("summary".to_string(), Value::Object(summary));
    Ok(metadata)
}

/// Header names with repeats suffixed `.1`, `.2`, ...
fn unique_headers(record: &csv::StringRecord) -> Vec<String> {
    if record.len() == 1 && record.get(0).is_some_and(|h| h.trim().is_empty()) {
        return Vec::new();
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    record
        .iter()
        .map(|raw| {
            let name = raw.trim().to_string();
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name.clone()
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct NumericStats {
    count: usize,
    mean: f64,
    std: f64,
    min: f64,
    q25: f64,
    q50: f64,
    q75: f64,
    max: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct CategoricalStats {
    count: usize,
    unique: usize,
    top: String,
    freq: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Described {
    Numeric(NumericStats),
    Categorical(CategoricalStats),
}

impl Described {
    fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Described::Numeric(s) => {
                map.insert("count".to_string(), json!(s.count));
                map.insert("mean".to_string(), number(s.mean));
                map.insert("std".to_string(), number(s.std));
                map.insert("min".to_string(), number(s.min));
                map.insert("25%".to_string(), number(s.q25));
                map.insert("50%".to_string(), number(s.q50));
                map.insert("75%".to_string(), number(s.q75));
                map.insert("max".to_string(), number(s.max));
            },
            Described::Categorical(s) => {
                map.insert("count".to_string(), json!(s.count));
                map.insert("unique".to_string(), json!(s.unique));
                map.insert("top".to_string(), json!(s.top));
                map.insert("freq".to_string(), json!(s.freq));
            },
        }
        map
    }
}

/// Undefined statistics render as an empty string
fn number(value: f64) -> Value {
    if value.is_finite() {
        json!(value)
    } else {
        json!("")
    }
}

fn describe(values: &[String]) -> Described {
    let parsed: Option<Vec<f64>> = values.iter().map(|v| v.parse::<f64>().ok()).collect();

    match parsed {
        Some(numbers) => Described::Numeric(describe_numeric(numbers)),
        None => Described::Categorical(describe_categorical(values)),
    }
}

fn describe_numeric(mut values: Vec<f64>) -> NumericStats {
    values.sort_by(f64::total_cmp);
    let count = values.len();

    if count == 0 {
        return NumericStats {
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            q50: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    let n = count as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if count > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        f64::NAN
    };

    NumericStats {
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        q50: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    }
}

/// Linear interpolation between closest ranks of sorted, non-empty `values`
fn quantile(values: &[f64], q: f64) -> f64 {
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    values[lower] + (values[upper] - values[lower]) * fraction
}

fn describe_categorical(values: &[String]) -> CategoricalStats {
    // (count, first position) per distinct value
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, value) in values.iter().enumerate() {
        counts.entry(value.as_str()).or_insert((0, position)).0 += 1;
    }

    let (top, (freq, _)) = counts
        .iter()
        .max_by(|(_, (a_count, a_first)), (_, (b_count, b_first))| {
            a_count.cmp(b_count).then(b_first.cmp(a_first))
        })
        .map(|(value, stats)| (value.to_string(), *stats))
        .unwrap_or_default();

    CategoricalStats {
        count: values.len(),
        unique: counts.len(),
        top,
        freq,
    }
}
