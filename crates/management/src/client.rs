//! Management API HTTP Client Implementation
//!
//! Talks to the management REST API. Group, invitation and settings calls
//! are environment scoped (`{base}/organizations/{org}/environments/{env}`);
//! user search and role listing are organization scoped.

use std::time::Duration;

use apim_common::{Error, Result};
use apim_groups::{
    ConsoleSettings, Group, GroupMembership, Invitation, ManagementApi, Member, Role, RoleScope,
    SearchableUser,
};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use crate::ManagementConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Real management API client.
pub struct HttpManagementClient {
    http: reqwest::Client,
    organization_url: Url,
    environment_url: Url,
    api_token: Option<String>,
}

fn parse_base(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| invalid_url(url, e))?;
    if parsed.cannot_be_a_base() {
        return Err(invalid_url(url, "not a base URL"));
    }
    Ok(parsed)
}

fn invalid_url(url: &str, reason: impl std::fmt::Display) -> Error {
    Error::Configuration(format!("Invalid management API URL {}: {}", url, reason))
}

/// Append path segments, percent-encoding each one
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

impl HttpManagementClient {
    pub fn new(config: ManagementConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            organization_url: parse_base(&config.organization_url())?,
            environment_url: parse_base(&config.environment_url())?,
            api_token: config.api_token,
        })
    }

    fn group_url(&self, group_id: &str, segments: &[&str]) -> Url {
        let mut path = vec!["configuration", "groups", group_id];
        path.extend_from_slice(segments);
        endpoint(&self.environment_url, &path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            tracing::warn!(status = %status, "Management API request rejected");
            return Err(Error::from_status(status, body));
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(self.http.get(url)).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl ManagementApi for HttpManagementClient {
    async fn get_group(&self, group_id: &str) -> Result<Group> {
        self.get(self.group_url(group_id, &[])).await
    }

    async fn get_members(&self, group_id: &str) -> Result<Vec<Member>> {
        self.get(self.group_url(group_id, &["members"])).await
    }

    async fn add_or_update_memberships(
        &self,
        group_id: &str,
        memberships: &[GroupMembership],
    ) -> Result<()> {
        let url = self.group_url(group_id, &["members"]);
        self.send(self.http.post(url).json(memberships)).await?;
        tracing::debug!(
            group_id = %group_id,
            count = memberships.len(),
            "Memberships posted"
        );
        Ok(())
    }

    async fn delete_member(&self, group_id: &str, member_id: &str) -> Result<()> {
        let url = self.group_url(group_id, &["members", member_id]);
        self.send(self.http.delete(url)).await?;
        tracing::debug!(group_id = %group_id, member_id = %member_id, "Member deleted");
        Ok(())
    }

    async fn get_invitations(&self, group_id: &str) -> Result<Vec<Invitation>> {
        self.get(self.group_url(group_id, &["invitations"])).await
    }

    async fn invite_member(&self, group_id: &str, invitation: &Invitation) -> Result<Invitation> {
        let url = self.group_url(group_id, &["invitations"]);
        let response = self.send(self.http.post(url).json(invitation)).await?;
        Ok(response.json::<Invitation>().await?)
    }

    async fn delete_invitation(&self, group_id: &str, invitation_id: &str) -> Result<()> {
        let url = self.group_url(group_id, &["invitations", invitation_id]);
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<SearchableUser>> {
        let url = endpoint(&self.organization_url, &["search", "users"]);
        let response = self.send(self.http.get(url).query(&[("q", query)])).await?;
        Ok(response.json::<Vec<SearchableUser>>().await?)
    }

    async fn list_roles(&self, scope: RoleScope) -> Result<Vec<Role>> {
        let url = endpoint(
            &self.organization_url,
            &["configuration", "rolescopes", scope.as_str(), "roles"],
        );
        self.get(url).await
    }

    async fn get_settings(&self) -> Result<ConsoleSettings> {
        self.get(endpoint(&self.environment_url, &["settings"]))
            .await
    }
}
