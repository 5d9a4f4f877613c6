//! Structural validation of raw metrics documents.
//!
//! The validator walks a [`serde_json::Value`] against a [`Schema`] and keeps
//! going after the first failure, so a rejected document reports every
//! violated constraint at once.

use std::fmt;
use std::sync::LazyLock;

use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy)]
pub struct KeyPattern {
    pub description: &'static str,
    pub matches: fn(&str) -> bool,
}

impl fmt::Debug for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description)
    }
}

#[derive(Debug)]
pub enum Schema {
    Object {
        properties: Vec<(&'static str, Schema)>,
        required: &'static [&'static str],
        pattern_properties: Option<(KeyPattern, Box<Schema>)>,
    },
    Array(Box<Schema>),
    String,
    Number,
    Integer { minimum: Option<i64> },
    Boolean,
    Enum(&'static [&'static str]),
}

impl Schema {
    pub fn object(properties: Vec<(&'static str, Schema)>, required: &'static [&'static str]) -> Self {
        Self::Object {
            properties,
            required,
            pattern_properties: None,
        }
    }

    pub fn map_of(pattern: KeyPattern, entry: Schema) -> Self {
        Self::Object {
            properties: Vec::new(),
            required: &[],
            pattern_properties: Some((pattern, Box::new(entry))),
        }
    }

    pub fn array_of(items: Schema) -> Self {
        Self::Array(Box::new(items))
    }

    pub fn count() -> Self {
        Self::Integer { minimum: Some(0) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub keyword: &'static str,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}; {}.", self.keyword, self.message)
        } else {
            write!(f, "{} '{}'; {}.", self.keyword, self.path, self.message)
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}", render_violations(.violations))]
pub struct SchemaError {
    pub violations: Vec<Violation>,
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn validate(schema: &Schema, data: &Value) -> Result<(), SchemaError> {
    let mut violations = Vec::new();
    check(schema, data, "", &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { violations })
    }
}

fn check(schema: &Schema, value: &Value, path: &str, out: &mut Vec<Violation>) {
    match schema {
        Schema::Object {
            properties,
            required,
            pattern_properties,
        } => {
            let Some(object) = value.as_object() else {
                out.push(type_violation(path, "object"));
                return;
            };

            for name in required.iter() {
                if !object.contains_key(*name) {
                    out.push(Violation {
                        keyword: "required",
                        path: path.to_owned(),
                        message: format!("should have required property '{name}'"),
                    });
                }
            }

            for (name, property_schema) in properties {
                if let Some(property) = object.get(*name) {
                    check(property_schema, property, &child_key(path, name), out);
                }
            }

            if let Some((pattern, entry_schema)) = pattern_properties {
                for (key, entry) in object {
                    if (pattern.matches)(key) {
                        check(entry_schema, entry, &child_key(path, key), out);
                    }
                }
            }
        }
        Schema::Array(items) => {
            let Some(array) = value.as_array() else {
                out.push(type_violation(path, "array"));
                return;
            };
            for (index, item) in array.iter().enumerate() {
                check(items, item, &format!("{path}[{index}]"), out);
            }
        }
        Schema::String => {
            if !value.is_string() {
                out.push(type_violation(path, "string"));
            }
        }
        Schema::Number => {
            if !value.is_number() {
                out.push(type_violation(path, "number"));
            }
        }
        Schema::Integer { minimum } => {
            let integral = value
                .as_f64()
                .is_some_and(|number| number.is_finite() && number.fract() == 0.0);
            if !integral {
                out.push(type_violation(path, "integer"));
                return;
            }

            if let Some(minimum) = minimum
                && value.as_f64().is_some_and(|number| number < *minimum as f64)
            {
                out.push(Violation {
                    keyword: "minimum",
                    path: path.to_owned(),
                    message: format!("should be >= {minimum}"),
                });
            }
        }
        Schema::Boolean => {
            if !value.is_boolean() {
                out.push(type_violation(path, "boolean"));
            }
        }
        Schema::Enum(allowed) => {
            let known = value.as_str().is_some_and(|text| allowed.contains(&text));
            if !known {
                out.push(Violation {
                    keyword: "enum",
                    path: path.to_owned(),
                    message: "should be equal to one of the allowed values".to_owned(),
                });
            }
        }
    }
}

fn type_violation(path: &str, expected: &str) -> Violation {
    Violation {
        keyword: "type",
        path: path.to_owned(),
        message: format!("should be {expected}"),
    }
}

fn child_key(path: &str, key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');

    if identifier {
        format!("{path}.{key}")
    } else {
        format!("{path}['{key}']")
    }
}

pub fn is_account_address(key: &str) -> bool {
    key.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

pub const ACCOUNT_ADDRESS: KeyPattern = KeyPattern {
    description: "^0x[0-9a-fA-F]{40}$",
    matches: is_account_address,
};

static NETWORK_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    let token = Schema::object(
        vec![
            ("address", Schema::String),
            ("decimals", Schema::count()),
            ("name", Schema::String),
            ("symbol", Schema::String),
        ],
        &["address", "decimals"],
    );

    let channel = Schema::object(
        vec![
            ("channel_identifier", Schema::count()),
            ("status", Schema::Enum(&["opened", "closed", "settled"])),
            ("participant1", Schema::String),
            ("participant2", Schema::String),
            ("deposit1", Schema::count()),
            ("deposit2", Schema::count()),
        ],
        &[
            "channel_identifier",
            "status",
            "participant1",
            "participant2",
            "deposit1",
            "deposit2",
        ],
    );

    let participant = Schema::object(
        vec![
            ("opened", Schema::count()),
            ("closed", Schema::count()),
            ("settled", Schema::count()),
            ("online", Schema::Boolean),
        ],
        &["opened", "closed", "settled"],
    );

    Schema::object(
        vec![
            ("address", Schema::String),
            ("token", token),
            ("num_channels_total", Schema::Number),
            ("num_channels_opened", Schema::Number),
            ("num_channels_closed", Schema::Number),
            ("num_channels_settled", Schema::Number),
            ("total_deposits", Schema::Number),
            ("avg_deposit_per_channel", Schema::Number),
            ("avg_deposit_per_node", Schema::Number),
            ("avg_channels_per_node", Schema::Number),
            ("channels", Schema::array_of(channel)),
            ("nodes", Schema::map_of(ACCOUNT_ADDRESS, participant)),
        ],
        &[
            "address",
            "token",
            "num_channels_total",
            "num_channels_opened",
            "num_channels_closed",
            "num_channels_settled",
            "total_deposits",
            "avg_deposit_per_channel",
            "avg_deposit_per_node",
            "avg_channels_per_node",
            "channels",
            "nodes",
        ],
    )
});

static METRICS_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    let account = Schema::object(
        vec![("address", Schema::String), ("channels", Schema::count())],
        &["address", "channels"],
    );

    Schema::object(
        vec![
            ("num_token_networks", Schema::count()),
            ("num_channels_opened", Schema::count()),
            ("num_channels_closed", Schema::count()),
            ("num_channels_settled", Schema::count()),
            ("num_nodes_with_open_channels", Schema::count()),
            ("avg_channels_per_node", Schema::Number),
            ("top_nodes_by_channels", Schema::array_of(account)),
        ],
        &[
            "num_token_networks",
            "num_channels_opened",
            "num_channels_closed",
            "num_channels_settled",
            "num_nodes_with_open_channels",
            "avg_channels_per_node",
            "top_nodes_by_channels",
        ],
    )
});

static SNAPSHOT_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    // Entries are checked one by one against the network schema afterwards.
    Schema::object(
        vec![("networks", Schema::Array(Box::new(Schema::object(Vec::new(), &[]))))],
        &["overall_metrics", "networks"],
    )
});

pub fn snapshot_schema() -> &'static Schema {
    &SNAPSHOT_SCHEMA
}

pub fn network_schema() -> &'static Schema {
    &NETWORK_SCHEMA
}

pub fn metrics_schema() -> &'static Schema {
    &METRICS_SCHEMA
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ALICE: &str = "0x00000000000000000000000000000000000000a1";

    fn valid_network() -> Value {
        json!({
            "address": "0xnetwork",
            "token": {"address": "0xtoken", "name": "Test", "symbol": "TTT", "decimals": 18},
            "num_channels_total": 1,
            "num_channels_opened": 1,
            "num_channels_closed": 0,
            "num_channels_settled": 0,
            "total_deposits": 10,
            "avg_deposit_per_channel": 10,
            "avg_deposit_per_node": 5,
            "avg_channels_per_node": 1,
            "channels": [{
                "channel_identifier": 1, "status": "opened",
                "participant1": ALICE, "participant2": ALICE,
                "deposit1": 10, "deposit2": 0
            }],
            "nodes": {ALICE: {"opened": 1, "closed": 0, "settled": 0}}
        })
    }

    #[test]
    fn accepts_well_formed_network() {
        assert_eq!(validate(network_schema(), &valid_network()), Ok(()));
    }

    #[test]
    fn reports_every_violation_not_just_the_first() {
        let mut network = valid_network();
        let object = network.as_object_mut().expect("object");
        object.remove("channels");
        object.insert("total_deposits".into(), json!("lots"));
        object["token"]["decimals"] = json!(-1);

        let error = validate(network_schema(), &network).expect_err("must fail");
        let keywords = error
            .violations
            .iter()
            .map(|violation| violation.keyword)
            .collect::<Vec<_>>();
        assert_eq!(keywords, vec!["required", "minimum", "type"]);
    }

    #[test]
    fn message_lines_follow_keyword_path_message_format() {
        let mut network = valid_network();
        network["channels"][0]["status"] = json!("frozen");
        network["nodes"][ALICE]["opened"] = json!("one");
        network.as_object_mut().expect("object").remove("address");

        let error = validate(network_schema(), &network).expect_err("must fail");
        let rendered = error.to_string();
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec![
                "required; should have required property 'address'.",
                "enum '.channels[0].status'; should be equal to one of the allowed values.",
                &format!("type '.nodes['{ALICE}'].opened'; should be integer."),
            ]
        );
    }

    #[test]
    fn keys_outside_the_address_pattern_are_not_checked() {
        let mut network = valid_network();
        network["nodes"]["not-an-address"] = json!({"opened": "garbage"});
        assert_eq!(validate(network_schema(), &network), Ok(()));
    }

    #[test]
    fn metrics_schema_checks_nested_array_items() {
        let metrics = json!({
            "num_token_networks": 1,
            "num_channels_opened": 1,
            "num_channels_closed": 0,
            "num_channels_settled": 0,
            "num_nodes_with_open_channels": 2,
            "avg_channels_per_node": 1.0,
            "top_nodes_by_channels": [{"address": ALICE, "channels": 1}, {"address": 5}]
        });

        let error = validate(metrics_schema(), &metrics).expect_err("must fail");
        assert_eq!(error.violations.len(), 2);
        assert_eq!(error.violations[0].path, ".top_nodes_by_channels[1]");
        assert_eq!(error.violations[1].path, ".top_nodes_by_channels[1].address");
    }

    #[test]
    fn wrong_root_type_is_a_single_type_violation() {
        let error = validate(snapshot_schema(), &json!([1, 2])).expect_err("must fail");
        assert_eq!(error.to_string(), "type; should be object.");
    }

    #[test]
    fn address_pattern_requires_forty_hex_digits() {
        assert!(is_account_address(ALICE));
        assert!(!is_account_address("0x1234"));
        assert!(!is_account_address("00000000000000000000000000000000000000a1aa"));
    }
}
