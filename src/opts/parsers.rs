use reqwest::Url;

use crate::prelude::*;

/// Validates the URL and strips the trailing slashes, so that paths can be appended.
pub fn base_url(value: &str) -> Result<String> {
    let url = Url::parse(value)?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("`{}` cannot be a base URL", value));
    }
    Ok(value.trim_end_matches('/').to_string())
}

pub fn sample_rate(value: &str) -> Result<f32> {
    match value.parse::<f32>()? {
        value if (0.0..=1.0).contains(&value) => Ok(value),
        _ => Err(anyhow!("expected a number between 0 and 1")),
    }
}
