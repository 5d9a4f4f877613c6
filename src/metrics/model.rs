use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::is_account_address;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_small_count")]
    pub decimals: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Opened,
    Closed,
    Settled,
}

impl ChannelStatus {
    pub const ALL: [Self; 3] = [Self::Opened, Self::Closed, Self::Settled];

    pub fn label(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Settled => "settled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Channel {
    #[serde(rename = "channel_identifier", deserialize_with = "deserialize_count")]
    pub identifier: u64,
    pub status: ChannelStatus,
    pub participant1: String,
    pub participant2: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub deposit1: u128,
    #[serde(deserialize_with = "deserialize_amount")]
    pub deposit2: u128,
}

impl Channel {
    pub fn combined_deposit(&self) -> u128 {
        self.deposit1.saturating_add(self.deposit2)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ParticipantChannels {
    #[serde(deserialize_with = "deserialize_small_count")]
    pub opened: u32,
    #[serde(deserialize_with = "deserialize_small_count")]
    pub closed: u32,
    #[serde(deserialize_with = "deserialize_small_count")]
    pub settled: u32,
    #[serde(default)]
    pub online: Option<bool>,
}

impl ParticipantChannels {
    /// Best-effort read of an entry the validator never checked: unreadable
    /// counts become zero.
    fn lenient(entry: &Value) -> Self {
        let count = |name: &str| {
            entry
                .get(name)
                .and_then(|value| deserialize_small_count(value).ok())
                .unwrap_or(0)
        };
        Self {
            opened: count("opened"),
            closed: count("closed"),
            settled: count("settled"),
            online: entry.get("online").and_then(Value::as_bool),
        }
    }
}

/// One token network exactly as the metrics backend reports it.
///
/// The pre-aggregated `num_*`/`avg_*` fields are validated but the aggregator
/// recomputes everything it exposes from `channels` and `nodes`.
#[derive(Clone, Debug, Deserialize)]
pub struct RawTokenNetwork {
    pub address: String,
    pub token: Token,
    #[serde(default)]
    pub num_channels_total: f64,
    #[serde(default)]
    pub num_channels_opened: f64,
    #[serde(default)]
    pub num_channels_closed: f64,
    #[serde(default)]
    pub num_channels_settled: f64,
    pub channels: Vec<Channel>,
    // Insertion order is the encounter order used for ranking ties.
    #[serde(deserialize_with = "deserialize_nodes")]
    pub nodes: IndexMap<String, ParticipantChannels>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountChannels {
    pub address: String,
    #[serde(deserialize_with = "deserialize_count")]
    pub channels: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReportedMetrics {
    #[serde(deserialize_with = "deserialize_count")]
    pub num_token_networks: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub num_channels_opened: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub num_channels_closed: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub num_channels_settled: u64,
    #[serde(deserialize_with = "deserialize_count")]
    pub num_nodes_with_open_channels: u64,
    pub avg_channels_per_node: f64,
    pub top_nodes_by_channels: Vec<AccountChannels>,
}

pub(crate) fn deserialize_amount<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    struct AmountVisitor;

    impl Visitor<'_> for AmountVisitor {
        type Value = u128;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a non-negative integer token amount")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u128, E> {
            Ok(u128::from(value))
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> Result<u128, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u128, E> {
            u128::try_from(value).map_err(|_| E::custom(format!("negative amount {value}")))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<u128, E> {
            // Amounts above 2^64 arrive as floats without arbitrary precision.
            if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
                Ok(value as u128)
            } else {
                Err(E::custom(format!("invalid amount {value}")))
            }
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

// Counts accept the same spellings as amounts; the schema only checks that
// they are integral, so anything wider saturates.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_amount(deserializer).map(|value| u64::try_from(value).unwrap_or(u64::MAX))
}

fn deserialize_small_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_amount(deserializer).map(|value| u32::try_from(value).unwrap_or(u32::MAX))
}

fn deserialize_nodes<'de, D>(deserializer: D) -> Result<IndexMap<String, ParticipantChannels>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = IndexMap::<String, Value>::deserialize(deserializer)?;
    entries
        .into_iter()
        .map(|(key, entry)| {
            let counts = if is_account_address(&key) {
                ParticipantChannels::deserialize(&entry)
                    .map_err(<D::Error as de::Error>::custom)?
            } else {
                tracing::debug!(key = %key, "participant key is not an address, reading leniently");
                ParticipantChannels::deserialize(&entry)
                    .unwrap_or_else(|_| ParticipantChannels::lenient(&entry))
            };
            Ok::<_, D::Error>((key, counts))
        })
        .collect()
}
