//! Per-member access codes handed out when a form is sent.
//!
//! A code is the send time in base 36, a dash, and six random base-36
//! characters, all upper case (e.g. `LUQ3K2M0-7FQX2A`). Team members enter it
//! to open their feedback form without an account.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use hr_feedback_core::Team;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_LEN: usize = 6;

/// A team member together with the code that opens their form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAccessCode {
    pub member_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub access_code: String,
}

/// Generate a single access code.
#[must_use]
pub fn generate_access_code() -> String {
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    code_at(millis, &mut rand::rng())
}

fn code_at(millis: u64, rng: &mut impl Rng) -> String {
    let suffix: String = (0..RANDOM_LEN)
        .filter_map(|_| ALPHABET.choose(rng).copied().map(char::from))
        .collect();
    format!("{}-{suffix}", base36(millis))
}

fn base36(mut n: u64) -> String {
    let mut digits = Vec::new();
    loop {
        let digit = usize::try_from(n % 36).unwrap_or_default();
        digits.extend(ALPHABET.get(digit).copied().map(char::from));
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// One distinct code per member of `team`.
///
/// Members with roles keep their ID, email and role; a plain member entry
/// is used as both ID and email.
#[must_use]
pub fn generate_team_access_codes(team: &Team) -> Vec<MemberAccessCode> {
    let members: Vec<(String, String, Option<String>)> = match &team.members_with_roles {
        Some(with_roles) => with_roles
            .iter()
            .map(|m| (m.member_id.clone(), m.email.clone(), Some(m.role.clone())))
            .collect(),
        None => team
            .members
            .iter()
            .map(|m| (m.clone(), m.clone(), None))
            .collect(),
    };

    let mut issued = HashSet::new();
    members
        .into_iter()
        .map(|(member_id, email, role)| {
            let mut access_code = generate_access_code();
            while !issued.insert(access_code.clone()) {
                access_code = generate_access_code();
            }
            MemberAccessCode {
                member_id,
                email,
                role,
                access_code,
            }
        })
        .collect()
}
