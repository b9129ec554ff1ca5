//! Fill data structures.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single trade execution as reported on the `userFills` channel.
///
/// Every field is optional. Numbers are kept in their textual form since
/// they are only displayed, never computed with. Fields are parsed
/// leniently: a value of an unexpected JSON type resolves to `None` (or to
/// its text when it is a scalar) instead of failing the whole frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    /// Asset traded, e.g. `BTC`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub coin: Option<String>,

    /// `B` (bid/buy) or `A` (ask/sell).
    #[serde(default, deserialize_with = "lenient_text")]
    pub side: Option<String>,

    #[serde(default, rename = "px", deserialize_with = "lenient_text")]
    pub price: Option<String>,

    #[serde(default, rename = "sz", deserialize_with = "lenient_text")]
    pub size: Option<String>,

    /// Execution time, milliseconds since epoch.
    #[serde(default, rename = "time", deserialize_with = "lenient_u64")]
    pub timestamp: Option<u64>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub fee: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub fee_token: Option<String>,

    /// `true` when the fill took liquidity.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub crossed: Option<bool>,

    /// Direction label, e.g. `Open Long`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub dir: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub closed_pnl: Option<String>,

    /// Trade ID.
    #[serde(default, deserialize_with = "lenient_text")]
    pub tid: Option<String>,

    /// Transaction hash.
    #[serde(default, deserialize_with = "lenient_text")]
    pub hash: Option<String>,

    /// Order ID.
    #[serde(default, deserialize_with = "lenient_text")]
    pub oid: Option<String>,
}

/// Renders as `[time] fill COIN SIDE sz=.. px=.. fee=.. TOKEN dir=.. pnl=.. taker`,
/// skipping absent parts.
impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(10);
        if let Some(t) = self.timestamp {
            parts.push(format!("[{t}]"));
        }
        parts.push("fill".to_string());
        parts.extend(self.coin.clone());
        parts.extend(self.side.clone());
        if let Some(sz) = &self.size {
            parts.push(format!("sz={sz}"));
        }
        if let Some(px) = &self.price {
            parts.push(format!("px={px}"));
        }
        if let Some(fee) = &self.fee {
            parts.push(format!("fee={fee}"));
            parts.extend(self.fee_token.clone());
        }
        if let Some(dir) = &self.dir {
            parts.push(format!("dir={dir}"));
        }
        if let Some(pnl) = &self.closed_pnl {
            parts.push(format!("pnl={pnl}"));
        }
        if let Some(crossed) = self.crossed {
            parts.push(if crossed { "taker" } else { "maker" }.to_string());
        }
        f.write_str(&parts.join(" "))
    }
}

/// Stable identity of a fill, scoped by wallet.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FillKey(String);

impl FillKey {
    pub(crate) fn new(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    };
    Ok(text.filter(|s| !s.is_empty()))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        _ => None,
    })
}
