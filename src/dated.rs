use chrono::NaiveDate;

pub const SUFFIX_LEN: usize = 4;
pub const TOKEN_LEN: usize = 10;
pub const MIN_KEY_LEN: usize = SUFFIX_LEN + TOKEN_LEN;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyShapeError {
    #[error("key too short for a date token: {len} bytes")]
    TooShort { len: usize },
    #[error("date token does not fall on character boundaries")]
    NotCharBoundary,
    #[error("token {token:?} is not a YYYY-MM-DD date")]
    BadDate { token: String },
}

/// `<name>_YYYY-MM-DD.ext`: ten bytes ending four before the end of the key.
pub fn date_token(key: &str) -> Result<&str, KeyShapeError> {
    let len = key.len();
    if len < MIN_KEY_LEN {
        return Err(KeyShapeError::TooShort { len });
    }
    let end = len - SUFFIX_LEN;
    key.get(end - TOKEN_LEN..end)
        .ok_or(KeyShapeError::NotCharBoundary)
}

pub fn parse_key_date(key: &str) -> Result<NaiveDate, KeyShapeError> {
    let token = date_token(key)?;
    NaiveDate::parse_from_str(token, DATE_FORMAT).map_err(|_| KeyShapeError::BadDate {
        token: token.to_string(),
    })
}

/// Keys without an underscore or a parseable token are skipped. Equal dates
/// keep input order, so the earliest listed key wins a tie.
pub fn most_recent<I, S>(keys: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut dated: Vec<(NaiveDate, String)> = keys
        .into_iter()
        .map(Into::into)
        .filter(|key| key.contains('_'))
        .filter_map(|key| match parse_key_date(&key) {
            Ok(date) => Some((date, key)),
            Err(err) => {
                tracing::debug!(key = %key, error = %err, "skipping undated key");
                None
            }
        })
        .collect();

    // sort_by is stable
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.into_iter().next().map(|(_, key)| key)
}
