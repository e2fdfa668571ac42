use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    dao::{
        competition_store::CompetitionStore,
        models::{
            CompetitionEntity, NewRestaurantEntity, RatingEntity, RatingSubmissionEntity,
            RestaurantEntity, StatusUpdateEntity, UserEntity,
        },
        storage::StorageResult,
    },
    state::competition::CompetitionStatus,
};

use super::{
    config::HttpStoreConfig,
    error::{HttpResult, HttpStoreError},
};

const CURRENT_USER: &str = "auth/user/";

/// [`CompetitionStore`] backed by the REST service the web application talks to.
#[derive(Clone)]
pub struct HttpCompetitionStore {
    client: Client,
    api_root: Arc<str>,
    token: Option<Arc<str>>,
}

impl HttpCompetitionStore {
    /// Build the client; no request is sent until the first operation.
    pub fn connect(config: HttpStoreConfig) -> HttpResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| HttpStoreError::ClientBuilder { source })?;

        Ok(Self {
            client,
            api_root: Arc::from(config.api_root()),
            token: config.token.map(Arc::from),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_root, path);
        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.header("Authorization", format!("Token {token}")),
            None => builder,
        }
    }

    async fn send<T>(&self, path: &str, builder: reqwest::RequestBuilder) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        let response = builder
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpStoreError::Rejected {
                path: path.to_string(),
                status,
                body,
            });
        }
        if !status.is_success() {
            return Err(HttpStoreError::RequestStatus {
                path: path.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| HttpStoreError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn get<T>(&self, path: &str) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(path, self.request(Method::GET, path)).await
    }

    async fn write<B, T>(&self, method: Method, path: &str, body: &B) -> HttpResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        self.send(path, self.request(method, path).json(body)).await
    }

    async fn find<T>(&self, path: &str) -> HttpResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.get(path).await {
            Ok(value) => Ok(Some(value)),
            Err(HttpStoreError::Rejected {
                status: StatusCode::NOT_FOUND,
                ..
            }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    // Membership endpoints answer with an arbitrary acknowledgement body.
    async fn post_ack(&self, path: &str) -> HttpResult<()> {
        let response = self
            .request(Method::POST, path)
            .send()
            .await
            .map_err(|source| HttpStoreError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_client_error() {
            Err(HttpStoreError::Rejected {
                path: path.to_string(),
                status,
                body: response.text().await.unwrap_or_default(),
            })
        } else {
            Err(HttpStoreError::RequestStatus {
                path: path.to_string(),
                status,
            })
        }
    }
}

impl CompetitionStore for HttpCompetitionStore {
    fn current_user(&self) -> BoxFuture<'static, StorageResult<UserEntity>> {
        let store = self.clone();
        Box::pin(async move { store.get(CURRENT_USER).await.map_err(Into::into) })
    }

    fn find_competition(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<CompetitionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find(&format!("competitions/{id}/"))
                .await
                .map_err(Into::into)
        })
    }

    fn list_restaurants(
        &self,
        competition_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RestaurantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get(&format!("restaurants/?competition={competition_id}"))
                .await
                .map_err(Into::into)
        })
    }

    fn list_ratings(
        &self,
        restaurant_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RatingEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get(&format!("ratings/?restaurant={restaurant_id}"))
                .await
                .map_err(Into::into)
        })
    }

    fn submit_rating(
        &self,
        submission: RatingSubmissionEntity,
    ) -> BoxFuture<'static, StorageResult<RatingEntity>> {
        let store = self.clone();
        Box::pin(async move {
            let result = match submission.replaces {
                Some(id) => {
                    store
                        .write(Method::PUT, &format!("ratings/{id}/"), &submission)
                        .await
                }
                None => store.write(Method::POST, "ratings/", &submission).await,
            };
            result.map_err(Into::into)
        })
    }

    fn create_restaurant(
        &self,
        restaurant: NewRestaurantEntity,
    ) -> BoxFuture<'static, StorageResult<RestaurantEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(Method::POST, "restaurants/", &restaurant)
                .await
                .map_err(Into::into)
        })
    }

    fn join_competition(&self, competition_id: i64) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .post_ack(&format!("competitions/{competition_id}/join/"))
                .await
                .map_err(Into::into)
        })
    }

    fn set_competition_status(
        &self,
        competition_id: i64,
        status: CompetitionStatus,
    ) -> BoxFuture<'static, StorageResult<CompetitionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .write(
                    Method::PATCH,
                    &format!("competitions/{competition_id}/"),
                    &StatusUpdateEntity { status },
                )
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .get::<UserEntity>(CURRENT_USER)
                .await
                .map(|_| ())
                .map_err(Into::into)
        })
    }
}
