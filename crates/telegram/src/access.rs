//! Operator access control.
//!
//! Every inbound message must come from an allow-listed operator; anything
//! else is silently dropped. Unlike an open-by-default gate, an empty operator
//! list denies everyone: running the bot without configuring operators must
//! not turn it into a public publishing endpoint.

/// Determine whether a sender may drive the bot.
///
/// Returns `Ok(())` if allowed, or `Err(reason)` if the message should be
/// silently dropped.
pub fn check_operator(
    operators: &[String],
    peer_id: &str,
    username: Option<&str>,
) -> Result<(), AccessDenied> {
    if operators.is_empty() {
        return Err(AccessDenied::NotAnOperator);
    }
    if is_listed(peer_id, operators) || username.is_some_and(|u| is_listed(u, operators)) {
        Ok(())
    } else {
        Err(AccessDenied::NotAnOperator)
    }
}

/// Reason an inbound message was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    NotAnOperator,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnOperator => write!(f, "sender is not an operator"),
        }
    }
}

/// Case-insensitive match against the operator list. Entries may use `*` as a
/// wildcard for any character sequence.
fn is_listed(candidate: &str, operators: &[String]) -> bool {
    let candidate = candidate.to_lowercase();
    operators.iter().any(|pattern| {
        let pat = pattern.to_lowercase();
        if pat.contains('*') {
            glob_match(&pat, &candidate)
        } else {
            pat == candidate
        }
    })
}

/// Simple glob matching supporting `*` as a wildcard for any sequence of chars.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(idx) => {
                // First segment must match at start
                if i == 0 && idx != 0 {
                    return false;
                }
                pos += idx + part.len();
            },
            None => return false,
        }
    }
    // Last segment must match at end (unless pattern ends with *)
    if !parts.last().unwrap_or(&"").is_empty() {
        pos == text.len()
    } else {
        true
    }
}
