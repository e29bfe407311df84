// nflverse release downloads over HTTP.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::with_season;
use crate::model::{RawRosterRow, RawWeeklyStatRow};
use crate::source::csv_rows::{parse_roster_csv, parse_weekly_csv};
use crate::source::{RosterKind, RowSource, SourceError, TableTemplates, TransportOptions};

/// Downloads CSV release assets and decodes them in memory.
pub struct HttpSource {
    http: reqwest::Client,
    templates: TableTemplates,
}

impl HttpSource {
    /// Build a source whose client honors `transport`. Relaxed certificate
    /// checking applies to this client only.
    pub fn new(templates: TableTemplates, transport: &TransportOptions) -> Result<Self, SourceError> {
        if transport.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for nflverse downloads");
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(transport.accept_invalid_certs)
            .timeout(transport.timeout)
            .user_agent(concat!("gridfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::Client)?;

        Ok(Self { http, templates })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        info!("Downloading {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| SourceError::Http {
            url: url.to_string(),
            source: e,
        })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl RowSource for HttpSource {
    fn describe(&self) -> String {
        format!("nflverse downloads ({})", self.templates.roster)
    }

    async fn roster_rows(
        &self,
        season: u16,
        kind: RosterKind,
    ) -> Result<Vec<RawRosterRow>, SourceError> {
        let url = with_season(self.templates.roster_for(kind), season);
        let body = self.fetch(&url).await?;
        parse_roster_csv(body.as_slice(), &url)
    }

    async fn weekly_stats(&self, season: u16) -> Result<Vec<RawWeeklyStatRow>, SourceError> {
        let url = with_season(&self.templates.stats, season);
        let body = self.fetch(&url).await?;
        parse_weekly_csv(body.as_slice(), &url)
    }
}
