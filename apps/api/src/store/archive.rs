use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::models::report::RawResume;

/// Destination for raw uploaded PDFs once their report is stored.
#[async_trait]
pub trait ResumeArchive: Send + Sync {
    /// Returns the object key the PDF was written under.
    async fn archive(&self, resume: &RawResume) -> anyhow::Result<String>;

    /// Removes every object archived for `resume_id`; returns how many went.
    async fn delete(&self, resume_id: Uuid) -> anyhow::Result<usize>;
}

/// Every archived object of one resume lives under this prefix.
pub fn archive_prefix(resume_id: Uuid) -> String {
    format!("resumes/{resume_id}/")
}

pub fn archive_key(resume: &RawResume) -> String {
    format!(
        "{}{}",
        archive_prefix(resume.id),
        sanitize_filename(&resume.filename)
    )
}

fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "resume.pdf".to_string()
    } else {
        cleaned
    }
}

pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Archive {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ResumeArchive for S3Archive {
    async fn archive(&self, resume: &RawResume) -> anyhow::Result<String> {
        let key = archive_key(resume);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(resume.bytes.clone()))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        info!("Archived resume PDF to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn delete(&self, resume_id: Uuid) -> anyhow::Result<usize> {
        let prefix = archive_prefix(resume_id);
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("S3 listing failed: {e}"))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_owned)),
            );
            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_owned())
                }
                _ => break,
            }
        }

        for key in &keys {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("S3 delete of {key} failed: {e}"))?;
        }

        info!(
            "Deleted {} archived objects under s3://{}/{}",
            keys.len(),
            self.bucket,
            prefix
        );
        Ok(keys.len())
    }
}

/// Used when no bucket is configured.
pub struct NoopArchive;

#[async_trait]
impl ResumeArchive for NoopArchive {
    async fn archive(&self, resume: &RawResume) -> anyhow::Result<String> {
        Ok(archive_key(resume))
    }

    async fn delete(&self, _resume_id: Uuid) -> anyhow::Result<usize> {
        Ok(0)
    }
}
