//! JSON boundary for requests and decisions.
//!
//! Channels arrive either keyed by index (`{"0": {...}}`) or as a plain
//! array whose positions are the indices. Both decode to the same
//! [`Request`]; the keyed form is what gets emitted.

use std::collections::{BTreeMap, HashMap};

use {
    chmask_algorithms::{ChannelMask, Request},
    chmask_common::{UplinkChannel, UplinkHistoryEntry},
    serde::{Deserialize, Deserializer, Serialize, de::Error as _},
    serde_json::Value,
};

use crate::error::HostError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    pub region_config_id: String,
    pub region_common_name: String,
    pub dev_eui: String,
    pub mac_version: String,
    pub reg_params_revision: String,
    pub uplink_channels: WireChannels,
    #[serde(default)]
    pub uplink_history: Vec<UplinkHistoryEntry>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub device_variables: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WireChannels {
    Keyed(BTreeMap<String, UplinkChannel>),
    Sequence(Vec<UplinkChannel>),
}

fn channel_body<E: serde::de::Error>(at: &str, value: Value) -> Result<UplinkChannel, E> {
    serde_json::from_value(value).map_err(|e| E::custom(format!("uplinkChannels[{at}]: {e}")))
}

// Decoded by shape so a bad channel body reports its own field error.
impl<'de> Deserialize<'de> for WireChannels {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| {
                    channel_body::<D::Error>(&format!("{key:?}"), value).map(|ch| (key, ch))
                })
                .collect::<Result<_, D::Error>>()
                .map(WireChannels::Keyed),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, value)| channel_body::<D::Error>(&i.to_string(), value))
                .collect::<Result<_, D::Error>>()
                .map(WireChannels::Sequence),
            other => Err(D::Error::custom(format!(
                "uplinkChannels must be an object or an array, got {other}"
            ))),
        }
    }
}

/// Parse a channel key. Only the canonical decimal form of an index is
/// accepted, so no two keys can name the same channel.
fn channel_index(key: &str) -> Result<usize, HostError> {
    match key.parse::<usize>() {
        Ok(index) if index.to_string() == key => Ok(index),
        _ => Err(invalid(format!("uplinkChannels key {key:?} is not a channel index"))),
    }
}

fn invalid(msg: impl Into<String>) -> HostError {
    HostError::InvalidRequest(msg.into())
}

impl TryFrom<WireRequest> for Request {
    type Error = HostError;

    fn try_from(w: WireRequest) -> Result<Self, Self::Error> {
        if w.region_config_id.trim().is_empty() {
            return Err(invalid("regionConfigId is empty"));
        }
        let region_common_name = w
            .region_common_name
            .parse()
            .map_err(|e| invalid(format!("regionCommonName: {e}")))?;
        let dev_eui = w
            .dev_eui
            .parse()
            .map_err(|e| invalid(format!("devEui: {e}")))?;
        let mac_version = w
            .mac_version
            .parse()
            .map_err(|e| invalid(format!("macVersion: {e}")))?;
        let reg_params_revision = w
            .reg_params_revision
            .parse()
            .map_err(|e| invalid(format!("regParamsRevision: {e}")))?;

        let uplink_channels: BTreeMap<usize, UplinkChannel> = match w.uplink_channels {
            WireChannels::Keyed(map) => {
                let mut channels = BTreeMap::new();
                for (key, ch) in map {
                    let index = channel_index(&key)?;
                    if channels.insert(index, ch).is_some() {
                        return Err(invalid(format!("uplink channel {index} is given twice")));
                    }
                }
                channels
            },
            WireChannels::Sequence(list) => list.into_iter().enumerate().collect(),
        };

        for (index, ch) in &uplink_channels {
            if ch.min_dr > ch.max_dr {
                return Err(invalid(format!(
                    "uplink channel {index}: minDr {} is above maxDr {}",
                    ch.min_dr, ch.max_dr
                )));
            }
        }

        if let Some(entry) = w.uplink_history.iter().find(|h| h.gateway_count == 0) {
            return Err(invalid(format!(
                "uplink history entry with fCnt {} has no gateways",
                entry.f_cnt
            )));
        }

        Ok(Request {
            region_config_id: w.region_config_id,
            region_common_name,
            dev_eui,
            mac_version,
            reg_params_revision,
            uplink_channels,
            uplink_history: w.uplink_history,
            device_variables: w.device_variables,
        })
    }
}

impl From<&Request> for WireRequest {
    fn from(r: &Request) -> Self {
        Self {
            region_config_id: r.region_config_id.clone(),
            region_common_name: r.region_common_name.to_string(),
            dev_eui: r.dev_eui.to_string(),
            mac_version: r.mac_version.to_string(),
            reg_params_revision: r.reg_params_revision.to_string(),
            uplink_channels: WireChannels::Keyed(
                r.uplink_channels
                    .iter()
                    .map(|(i, ch)| (i.to_string(), ch.clone()))
                    .collect(),
            ),
            uplink_history: r.uplink_history.clone(),
            device_variables: r.device_variables.clone(),
        }
    }
}

/// Decode and validate a JSON request.
pub fn parse_request(json: &str) -> Result<Request, HostError> {
    let wire: WireRequest = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
    wire.try_into()
}

/// Decode a request already parsed as JSON.
pub fn request_from_value(value: Value) -> Result<Request, HostError> {
    let wire: WireRequest = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    wire.try_into()
}

/// Encode a request in its canonical keyed form.
pub fn request_to_json(req: &Request) -> Result<String, HostError> {
    serde_json::to_string_pretty(&WireRequest::from(req)).map_err(|e| invalid(e.to_string()))
}

/// Decode a raw decision (a JSON array of channel indices) returned by an
/// out-of-process algorithm. Anything other than non-negative integers is a
/// contract violation.
pub fn parse_decision(algorithm_id: &str, value: &Value) -> Result<Vec<usize>, HostError> {
    let Value::Array(items) = value else {
        return Err(HostError::violation(algorithm_id, value));
    };
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| HostError::violation(algorithm_id, item))
        })
        .collect()
}

/// Encode a decision as the JSON array handed back to the caller.
pub fn decision_to_json(mask: &ChannelMask) -> Value {
    Value::Array(mask.iter().map(Value::from).collect())
}

#[cfg(test)]
mod tests {
    use {super::*, chmask_common::CommonName, serde_json::json};

    fn base() -> Value {
        json!({
            "regionConfigId": "eu868",
            "regionCommonName": "EU868",
            "devEui": "0102030405060708",
            "macVersion": "1.0.4",
            "regParamsRevision": "RP002-1.0.3",
            "uplinkChannels": {
                "0": { "frequency": 868100000, "minDr": 0, "maxDr": 5, "enabled": true },
                "1": { "frequency": 868300000, "minDr": 0, "maxDr": 5, "enabled": true },
                "3": { "frequency": 867100000, "minDr": 0, "maxDr": 5, "enabled": false }
            },
            "uplinkHistory": [
                { "fCnt": 10, "maxSnr": 7.5, "maxRssi": -80, "txPowerIndex": 0, "gatewayCount": 2 }
            ]
        })
    }

    #[test]
    fn test_parse_keyed_request() {
        let req = parse_request(&base().to_string()).unwrap();
        assert_eq!(req.region_common_name, CommonName::EU868);
        assert_eq!(req.available_channel_indices(), vec![0, 1, 3]);
        assert_eq!(req.enabled_channel_indices().to_vec(), vec![0, 1]);
        assert_eq!(req.uplink_history.len(), 1);
        assert!(req.device_variables.is_empty());
    }

    #[test]
    fn test_sequence_form_is_reemitted_keyed() {
        let mut v = base();
        v["uplinkChannels"] = json!([
            { "frequency": 868100000, "minDr": 0, "maxDr": 5, "enabled": true },
            { "frequency": 868300000, "minDr": 0, "maxDr": 5, "enabled": false }
        ]);
        let req = parse_request(&v.to_string()).unwrap();
        assert_eq!(req.available_channel_indices(), vec![0, 1]);

        let out: Value = serde_json::from_str(&request_to_json(&req).unwrap()).unwrap();
        assert!(out["uplinkChannels"].is_object());
        assert_eq!(out["uplinkChannels"]["1"]["frequency"], 868300000);
    }

    #[test]
    fn test_invalid_requests() {
        let cases: Vec<(&str, Value)> = vec![
            ("devEui", json!("zz")),
            ("regionCommonName", json!("EU999")),
            ("macVersion", json!("9.9.9")),
            ("regionConfigId", json!("")),
        ];
        for (field, bad) in cases {
            let mut v = base();
            v[field] = bad;
            assert!(
                matches!(parse_request(&v.to_string()), Err(HostError::InvalidRequest(_))),
                "{field} should be rejected"
            );
        }

        let mut v = base();
        v["uplinkChannels"]["0"]["minDr"] = json!(6);
        assert!(parse_request(&v.to_string()).is_err());

        let mut v = base();
        v["uplinkHistory"][0]["gatewayCount"] = json!(0);
        assert!(parse_request(&v.to_string()).is_err());

        let mut v = base();
        v["uplinkChannels"] = json!({ "first": { "frequency": 1, "minDr": 0, "maxDr": 0, "enabled": true } });
        assert!(parse_request(&v.to_string()).is_err());

        assert!(parse_request("{}").is_err());
    }

    #[test]
    fn test_channel_keys_must_be_canonical() {
        for key in ["00", "+1", " 1", "01"] {
            let mut v = base();
            v["uplinkChannels"][key] = json!({ "frequency": 868500000, "minDr": 0, "maxDr": 5, "enabled": false });
            assert!(
                matches!(parse_request(&v.to_string()), Err(HostError::InvalidRequest(_))),
                "key {key:?} should be rejected"
            );
        }

        // An alias of an existing key must not replace that channel.
        let mut v = base();
        v["uplinkChannels"]["00"] = json!({ "frequency": 868300000, "minDr": 0, "maxDr": 5, "enabled": false });
        assert!(parse_request(&v.to_string()).is_err());
        assert_eq!(channel_index("10").unwrap(), 10);
    }

    #[test]
    fn test_bad_channel_body_reports_field() {
        let mut v = base();
        v["uplinkChannels"]["1"]
            .as_object_mut()
            .unwrap()
            .remove("enabled");
        let Err(HostError::InvalidRequest(msg)) = parse_request(&v.to_string()) else {
            panic!("missing enabled should be rejected");
        };
        assert!(msg.contains("enabled"), "{msg}");
        assert!(msg.contains("\"1\""), "{msg}");

        let mut v = base();
        v["uplinkChannels"] = json!([{ "frequency": 1, "minDr": 0, "enabled": true }]);
        let Err(HostError::InvalidRequest(msg)) = parse_request(&v.to_string()) else {
            panic!("missing maxDr should be rejected");
        };
        assert!(msg.contains("maxDr"), "{msg}");

        let mut v = base();
        v["uplinkChannels"] = json!("none");
        assert!(parse_request(&v.to_string()).is_err());
    }

    #[test]
    fn test_parse_decision() {
        assert_eq!(parse_decision("x", &json!([2, 0, 2])).unwrap(), vec![2, 0, 2]);
        assert!(parse_decision("x", &json!([])).unwrap().is_empty());
        assert!(matches!(
            parse_decision("x", &json!([0, -1])),
            Err(HostError::ContractViolation { .. })
        ));
        assert!(parse_decision("x", &json!([1.5])).is_err());
        assert!(parse_decision("x", &json!({"0": true})).is_err());
    }

    #[test]
    fn test_decision_to_json() {
        let mask = ChannelMask::from(vec![2, 0]);
        assert_eq!(decision_to_json(&mask), json!([0, 2]));
    }
}
