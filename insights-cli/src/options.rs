//! Option documents and command-line overrides.
//!
//! The input is either a bare query string or a YAML mapping carrying a
//! `query` key alongside the other run options. Flags given on the command
//! line win over the document.

use std::path::{Path, PathBuf};

use insights_engine::{TimeSpec, DEFAULT_LIMIT};
use serde::Deserialize;
use serde_yaml::Value;
use tokio::io::AsyncReadExt;

use crate::error::CliError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionDocument {
    pub query: Option<String>,
    #[serde(alias = "group")]
    pub groups: Option<StringList>,
    pub start: Option<TimeSpec>,
    pub end: Option<TimeSpec>,
    pub limit: Option<u32>,
    #[serde(alias = "out")]
    pub out_file: Option<PathBuf>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub json_fields: Option<StringList>,
    pub jsonify: Option<bool>,
    pub quiet: Option<bool>,
}

/// A YAML sequence of strings or a single comma separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    One(String),
    Many(Vec<String>),
}

impl StringList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringList::One(value) => split_list([value]),
            StringList::Many(values) => split_list(values),
        }
    }
}

fn split_list<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    values
        .into_iter()
        .flat_map(|value| {
            value
                .split(',')
                .map(|item| item.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Values taken from command-line flags.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub groups: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<u32>,
    pub out_file: Option<PathBuf>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub json_fields: Vec<String>,
    pub no_jsonify: bool,
    pub quiet: bool,
}

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub query: String,
    pub groups: Vec<String>,
    pub start: TimeSpec,
    pub end: TimeSpec,
    pub limit: u32,
    pub out_file: Option<PathBuf>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub json_fields: Vec<String>,
    pub jsonify: bool,
    /// `None` lets the caller decide from the terminal.
    pub quiet: Option<bool>,
}

/// Reads the query input from `path`, or from stdin when no path is given.
pub async fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CliError::ReadInput {
                path: path.display().to_string(),
                source,
            }),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .map_err(|source| CliError::ReadInput {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(buffer)
        }
    }
}

/// Interprets raw input as an option document when it is a YAML mapping
/// with a `query` key, and as query text otherwise.
pub fn parse_document(raw: &str) -> Result<OptionDocument, CliError> {
    if let Ok(Value::Mapping(map)) = serde_yaml::from_str::<Value>(raw) {
        if map.iter().any(|(key, _)| key.as_str() == Some("query")) {
            return Ok(serde_yaml::from_value(Value::Mapping(map))?);
        }
    }

    Ok(OptionDocument {
        query: Some(raw.trim().to_string()),
        ..OptionDocument::default()
    })
}

pub fn resolve(document: OptionDocument, cli: CliOverrides) -> Result<RunOptions, CliError> {
    let query = document
        .query
        .map(|query| query.trim().to_string())
        .filter(|query| !query.is_empty())
        .ok_or_else(|| CliError::Usage("no query given".to_string()))?;

    let mut groups = if cli.groups.is_empty() {
        document.groups.map(StringList::into_vec).unwrap_or_default()
    } else {
        split_list(cli.groups)
    };
    groups.sort();
    groups.dedup();
    if groups.is_empty() {
        return Err(CliError::Usage(
            "no log groups given (use --group or a `groups` key)".to_string(),
        ));
    }

    let start = match cli.start {
        Some(raw) => raw.parse()?,
        None => document.start.unwrap_or_else(|| TimeSpec::days_ago(1)),
    };
    let end = match cli.end {
        Some(raw) => raw.parse()?,
        None => document.end.unwrap_or_else(TimeSpec::now),
    };

    let json_fields = if cli.json_fields.is_empty() {
        document
            .json_fields
            .map(StringList::into_vec)
            .unwrap_or_default()
    } else {
        split_list(cli.json_fields)
    };

    Ok(RunOptions {
        query,
        groups,
        start,
        end,
        limit: cli.limit.or(document.limit).unwrap_or(DEFAULT_LIMIT),
        out_file: cli.out_file.or(document.out_file),
        region: cli.region.or(document.region),
        endpoint: cli.endpoint.or(document.endpoint),
        json_fields,
        jsonify: !cli.no_jsonify && document.jsonify.unwrap_or(true),
        quiet: if cli.quiet { Some(true) } else { document.quiet },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;

    const QUERY: &str = "fields @timestamp, @message\n| sort @timestamp desc";

    #[test]
    fn plain_text_is_the_query() {
        let document = parse_document(QUERY).unwrap();
        assert_eq!(document.query.as_deref(), Some(QUERY));
        assert!(document.groups.is_none());
    }

    #[test]
    fn mapping_without_query_key_is_plain_text() {
        let document = parse_document("fields: @message").unwrap();
        assert_eq!(document.query.as_deref(), Some("fields: @message"));
    }

    #[test]
    fn flags_resolve_with_comma_separated_groups() {
        let cli = CliOverrides {
            groups: vec!["b,a".into()],
            start: Some("-30d".into()),
            limit: Some(139),
            ..CliOverrides::default()
        };
        let options = resolve(parse_document(QUERY).unwrap(), cli).unwrap();

        assert_eq!(options.query, QUERY);
        assert_eq!(options.groups, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(options.start, TimeSpec::Offset(-Duration::days(30)));
        assert_eq!(options.end, TimeSpec::now());
        assert_eq!(options.limit, 139);
        assert!(options.jsonify);
        assert_eq!(options.quiet, None);
    }

    #[test]
    fn option_document_supplies_every_field() {
        let raw = "\
query: |
  fields @message
groups: [c, a, c]
start: 1990-01-01
end: 0
limit: 30
out_file: out.jsonl
json_fields: payload, detail
jsonify: false
";
        let options = resolve(parse_document(raw).unwrap(), CliOverrides::default()).unwrap();
        let start = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(options.query, "fields @message");
        assert_eq!(options.groups, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(options.start, TimeSpec::At(start));
        assert_eq!(options.end.normalize(start).unwrap(), start.timestamp());
        assert_eq!(options.limit, 30);
        assert_eq!(options.out_file, Some(PathBuf::from("out.jsonl")));
        assert_eq!(
            options.json_fields,
            vec!["payload".to_string(), "detail".to_string()]
        );
        assert!(!options.jsonify);
    }

    #[test]
    fn flags_override_the_document() {
        let raw = "query: fields @message\ngroups: [doc]\nlimit: 30\nquiet: false\n";
        let cli = CliOverrides {
            groups: vec!["flag".into()],
            limit: Some(5),
            no_jsonify: true,
            quiet: true,
            ..CliOverrides::default()
        };
        let options = resolve(parse_document(raw).unwrap(), cli).unwrap();

        assert_eq!(options.groups, vec!["flag".to_string()]);
        assert_eq!(options.limit, 5);
        assert!(!options.jsonify);
        assert_eq!(options.quiet, Some(true));
    }

    #[test]
    fn missing_groups_is_a_usage_error() {
        let err = resolve(parse_document(QUERY).unwrap(), CliOverrides::default()).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn bad_time_flag_is_rejected() {
        let cli = CliOverrides {
            groups: vec!["a".into()],
            start: Some("last tuesday".into()),
            ..CliOverrides::default()
        };
        let err = resolve(parse_document(QUERY).unwrap(), cli).unwrap_err();
        assert!(matches!(err, CliError::Insights(_)));
    }

    #[test]
    fn out_of_range_document_offsets_are_rejected() {
        let err = parse_document("query: q\nstart: {days: -1e15}\n").unwrap_err();
        assert!(matches!(err, CliError::OptionDocument(_)));
    }

    #[test]
    fn unknown_document_keys_are_rejected() {
        let err = parse_document("query: x\nlimt: 3\n").unwrap_err();
        assert!(matches!(err, CliError::OptionDocument(_)));
    }

    #[tokio::test]
    async fn reads_input_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", QUERY).unwrap();

        let raw = read_input(Some(file.path())).await.unwrap();
        assert_eq!(raw, QUERY);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = read_input(Some(Path::new("/nonexistent/query.acwi")))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/query.acwi"));
    }
}
