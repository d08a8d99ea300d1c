use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::prelude::*;
use crate::window::Number;

pub type UserId = u64;
pub type PostId = u64;

/// Number sequence kind, as addressed by the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Primes,
    Fibonacci,
    Even,
    Random,
}

impl Category {
    pub const fn to_str(self) -> &'static str {
        match self {
            Self::Primes => "p",
            Self::Fibonacci => "f",
            Self::Even => "e",
            Self::Random => "r",
        }
    }

    /// Upstream endpoint path.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Primes => "primes",
            Self::Fibonacci => "fibo",
            Self::Even => "even",
            Self::Random => "rand",
        }
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "p" => Ok(Self::Primes),
            "f" => Ok(Self::Fibonacci),
            "e" => Ok(Self::Even),
            "r" => Ok(Self::Random),
            _ => Err(anyhow!("`{}` is not a valid number category", value)),
        }
    }
}

impl Display for Category {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.to_str())
    }
}

#[derive(Deserialize, Debug)]
pub struct NumbersResponse {
    #[serde(default)]
    pub numbers: Vec<Number>,
}

/// The user list comes either as a bare array of IDs or as an ID-to-name map.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum UsersResponse {
    Ids(Vec<UserId>),
    Names { users: BTreeMap<String, String> },
}

impl UsersResponse {
    pub fn into_ids(self) -> Vec<UserId> {
        match self {
            Self::Ids(ids) => ids,
            Self::Names { users } => users
                .into_keys()
                .filter_map(|user_id| user_id.parse::<UserId>().ok())
                .sorted_unstable()
                .collect(),
        }
    }
}

/// Upstream post, forwarded as received.
///
/// Only the ID is interpreted, every other field is kept verbatim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Comments are only counted and forwarded.
pub type Comment = Value;

#[derive(Serialize, Deserialize, Debug)]
pub struct PostsResponse {
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CommentsResponse {
    #[serde(default)]
    pub comments: Vec<Comment>,
}
