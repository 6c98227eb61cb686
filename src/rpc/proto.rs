//! Protobuf messages for the `mindns.v1.MindnsService` API.
//!
//! The messages are declared directly with `prost` derives rather than generated from `.proto`
//! files. RRset records travel as `google.protobuf.Any`, so an RRset can carry any record kind;
//! the solver only understands [`Txt`].

use crate::rpc::{RRset as DomainRRset, TxtRecord};
use prost::Message;
use prost_types::Any;
use trust_dns_proto::rr::RecordType;

pub const SERVICE_NAME: &str = "mindns.v1.MindnsService";
pub const GET_RRSET_PATH: &str = "/mindns.v1.MindnsService/GetRRset";
pub const SET_RRSET_PATH: &str = "/mindns.v1.MindnsService/SetRRset";
pub const DELETE_RRSET_PATH: &str = "/mindns.v1.MindnsService/DeleteRRset";

pub const TXT_TYPE_URL: &str = "type.googleapis.com/mindns.v1.TXT";

const CLASS_INET: u32 = 1;

#[derive(Clone, PartialEq, Message)]
pub struct GetRRsetRequest {
    #[prost(string, tag = "1")]
    pub zone: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(uint32, tag = "3")]
    pub r#type: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetRRsetRequest {
    #[prost(string, tag = "1")]
    pub zone: String,
    #[prost(message, optional, tag = "2")]
    pub rrset: Option<RRset>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SetRRsetResponse {}

#[derive(Clone, PartialEq, Message)]
pub struct DeleteRRsetRequest {
    #[prost(string, tag = "1")]
    pub zone: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(uint32, tag = "3")]
    pub r#type: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeleteRRsetResponse {}

#[derive(Clone, PartialEq, Message)]
pub struct RRset {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint32, tag = "2")]
    pub r#type: u32,
    #[prost(uint32, tag = "3")]
    pub ttl: u32,
    #[prost(message, repeated, tag = "4")]
    pub records: Vec<Any>,
}

#[derive(Clone, PartialEq, Message)]
pub struct RrHeader {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(uint32, tag = "2")]
    pub rrtype: u32,
    #[prost(uint32, tag = "3")]
    pub class: u32,
    #[prost(uint32, tag = "4")]
    pub ttl: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct TxtData {
    #[prost(string, repeated, tag = "1")]
    pub txt: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Txt {
    #[prost(message, optional, tag = "1")]
    pub hdr: Option<RrHeader>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<TxtData>,
}

pub fn wire_type(rtype: RecordType) -> u32 {
    u32::from(u16::from(rtype))
}

impl From<&TxtRecord> for Txt {
    fn from(record: &TxtRecord) -> Self {
        Txt {
            hdr: Some(RrHeader {
                name: record.name.clone(),
                rrtype: wire_type(RecordType::TXT),
                class: CLASS_INET,
                ttl: record.ttl,
            }),
            data: Some(TxtData {
                txt: record.values.clone(),
            }),
        }
    }
}

impl From<Txt> for TxtRecord {
    fn from(txt: Txt) -> Self {
        let (name, ttl) = txt.hdr.map_or((String::new(), 0), |hdr| (hdr.name, hdr.ttl));
        TxtRecord {
            name,
            ttl,
            values: txt.data.map(|data| data.txt).unwrap_or_default(),
        }
    }
}

impl From<&TxtRecord> for Any {
    fn from(record: &TxtRecord) -> Self {
        Any {
            type_url: TXT_TYPE_URL.to_string(),
            value: Txt::from(record).encode_to_vec(),
        }
    }
}

/// Decode the TXT records held in `records`, skipping records of other kinds and records
/// that fail to decode.
pub fn txt_records(records: &[Any]) -> Vec<TxtRecord> {
    records
        .iter()
        .filter_map(|any| {
            if any.type_url != TXT_TYPE_URL {
                tracing::debug!("skipping non-TXT record of type {}", any.type_url);
                return None;
            }
            match Txt::decode(any.value.as_slice()) {
                Ok(txt) => Some(txt.into()),
                Err(err) => {
                    tracing::warn!("skipping undecodable TXT record: {err}");
                    None
                }
            }
        })
        .collect()
}

impl From<&DomainRRset> for RRset {
    fn from(rrset: &DomainRRset) -> Self {
        RRset {
            name: rrset.name.clone(),
            r#type: wire_type(rrset.rtype),
            ttl: rrset.ttl,
            records: rrset.records.iter().map(Any::from).collect(),
        }
    }
}

impl From<RRset> for DomainRRset {
    fn from(rrset: RRset) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let rtype = RecordType::from(rrset.r#type as u16);
        DomainRRset {
            records: txt_records(&rrset.records),
            name: rrset.name,
            rtype,
            ttl: rrset.ttl,
        }
    }
}
