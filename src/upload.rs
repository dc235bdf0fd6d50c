use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use log::info;
use serde::Deserialize;
use serde_json::json;

const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";

/// Seconds west of UTC for Pacific Daylight Time.
const PACIFIC_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

/// Publishes finished videos through the YouTube resumable upload API.
///
/// Uploads are always scheduled rather than published immediately: the video
/// goes live at noon Pacific on the day after the upload, which is when the
/// short-form audience is awake.
pub struct YouTubeUploader {
    client: reqwest::blocking::Client,
    access_token: String,
}

impl YouTubeUploader {
    pub fn new(access_token: &str) -> YouTubeUploader {
        YouTubeUploader {
            client: reqwest::blocking::Client::new(),
            access_token: access_token.to_string(),
        }
    }

    /// Upload the file at `path` and return the new video id.
    pub fn upload(
        &self,
        path: &Path,
        title: &str,
        description: &str,
        tags: &[String],
        category: &str,
        privacy: &str,
    ) -> Result<String> {
        let publish_at = next_best_upload_time(Utc::now());
        info!(
            "uploading {} as '{title}', scheduled for {publish_at}",
            path.display()
        );

        let metadata = json!({
            "snippet": {
                "title": title,
                "description": description,
                "tags": tags,
                "categoryId": category,
            },
            "status": {
                "privacyStatus": privacy,
                "publishAt": publish_at,
                "license": "creativeCommon",
                "embeddable": true,
                "publicStatsViewable": true,
            },
        });

        let session = self
            .client
            .post(UPLOAD_URL)
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", "video/mp4")
            .json(&metadata)
            .send()
            .context("starting upload session")?
            .error_for_status()
            .context("upload session rejected")?;

        let session_url = session
            .headers()
            .get("Location")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| anyhow!("upload session response carried no Location header"))?
            .to_string();

        let bytes = fs::read(path)
            .with_context(|| format!("reading video file {}", path.display()))?;
        let response: UploadResponse = self
            .client
            .put(&session_url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .send()
            .context("uploading video bytes")?
            .error_for_status()
            .context("upload rejected")?
            .json()
            .context("parsing upload response")?;

        Ok(response.id)
    }
}

/// Noon Pacific on the day after `now`, as an RFC 3339 UTC timestamp.
fn next_best_upload_time(now: DateTime<Utc>) -> String {
    let pacific = FixedOffset::west_opt(PACIFIC_OFFSET_SECS).expect("offset is in range");
    let tomorrow = now
        .with_timezone(&pacific)
        .date_naive()
        .succ_opt()
        .expect("not the last representable day");
    let noon = tomorrow.and_hms_opt(12, 0, 0).expect("valid wall clock time");
    noon.and_local_timezone(pacific)
        .single()
        .expect("fixed offsets are unambiguous")
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
