//! REST adapter over reqwest

use ama_common::ApiConfig;
use ama_core::{ApiResult as PortResult, Message, MessageId, RoomApi, RoomId};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use tracing::{debug, instrument};
use validator::Validate;

use crate::dto::{
    CreateMessageRequest, CreateRoomRequest, CreatedResponse, ReactionCountResponse,
    RoomMessageResponse,
};
use crate::error::{ApiError, ApiResult};

/// Client for the AMA REST API
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    client: Client,
    base: Url,
}

impl HttpRoomApi {
    /// Build a client with the configured timeout
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(client, &config.base_url)
    }

    /// Use an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> ApiResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(base_url.to_string()));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Create a room and return its id
    #[instrument(skip(self))]
    pub async fn create_room(&self, theme: &str) -> ApiResult<RoomId> {
        let body = CreateRoomRequest::new(theme);
        body.validate()?;

        let url = self.endpoint(&["rooms"])?;
        let response = self.client.post(url).json(&body).send().await?;
        let created: CreatedResponse = check(response).await?.json().await?;

        debug!(room_id = %created.id, "Room created");
        Ok(RoomId::from(created.id))
    }

    /// Post a question to a room and return its id
    ///
    /// The message itself arrives through the live channel like everyone else's.
    #[instrument(skip(self, text), fields(room_id = %room_id))]
    pub async fn create_message(&self, room_id: &RoomId, text: &str) -> ApiResult<MessageId> {
        let body = CreateMessageRequest::new(text);
        body.validate()?;

        let url = self.endpoint(&["rooms", room_id.as_str(), "messages"])?;
        let response = self.client.post(url).json(&body).send().await?;
        let created: CreatedResponse = check(response).await?.json().await?;

        debug!(message_id = %created.id, "Message created");
        Ok(MessageId::from(created.id))
    }

    /// Get every message of a room
    #[instrument(skip(self), fields(room_id = %room_id))]
    pub async fn messages(&self, room_id: &RoomId) -> ApiResult<Vec<Message>> {
        let url = self.endpoint(&["rooms", room_id.as_str(), "messages"])?;
        let response = self.client.get(url).send().await?;
        let list: Vec<RoomMessageResponse> = check(response).await?.json().await?;

        debug!(count = list.len(), "Messages fetched");
        Ok(list.into_iter().map(Message::from).collect())
    }

    /// `PATCH` adds a reaction, `DELETE` removes one
    #[instrument(skip(self), fields(room_id = %room_id, message_id = %message_id))]
    pub async fn reaction(
        &self,
        method: Method,
        room_id: &RoomId,
        message_id: &MessageId,
    ) -> ApiResult<u64> {
        let url = self.endpoint(&[
            "rooms",
            room_id.as_str(),
            "messages",
            message_id.as_str(),
            "react",
        ])?;
        let response = self.client.request(method, url).send().await?;
        let body: ReactionCountResponse = check(response).await?.json().await?;

        Ok(body.reaction_count.get())
    }

    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Turn non-2xx responses into errors, keeping the body for the log
async fn check(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

#[async_trait]
impl RoomApi for HttpRoomApi {
    async fn fetch_messages(&self, room_id: &RoomId) -> PortResult<Vec<Message>> {
        Ok(self.messages(room_id).await?)
    }

    async fn add_reaction(&self, room_id: &RoomId, message_id: &MessageId) -> PortResult<u64> {
        Ok(self.reaction(Method::PATCH, room_id, message_id).await?)
    }

    async fn remove_reaction(&self, room_id: &RoomId, message_id: &MessageId) -> PortResult<u64> {
        Ok(self.reaction(Method::DELETE, room_id, message_id).await?)
    }
}
