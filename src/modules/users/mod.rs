pub mod models;
pub mod password;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use bookshelf_http::AppError;
use bookshelf_kernel::{InitCtx, Module};
use bookshelf_store::{Collection, StoreError};
use serde_json::json;

use models::{PasswordChange, PasswordReset, Registration, User, UserResponse, UserView};
use password::PasswordHasher;

/// Collaborator the users handlers read and write through.
pub type UserCollection = Arc<dyn Collection<User>>;

const BAD_REQUEST: &str = "Bad request";
const CONFLICT: &str = "Conflict";
const USER_NOT_FOUND: &str = "User not found";
const REGISTERED: &str = "Authentication successful";
const PASSWORD_RESET: &str = "Password reset successful";

#[derive(Clone)]
struct UsersState {
    users: UserCollection,
    hasher: PasswordHasher,
}

/// Account registration and password reset mounted at `/api/users`
pub struct UsersModule {
    state: UsersState,
}

impl UsersModule {
    pub fn new(users: UserCollection, hasher: PasswordHasher) -> Self {
        Self {
            state: UsersState { users, hasher },
        }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            bcrypt_cost = self.state.hasher.cost(),
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", post(register_user))
            .route("/{email}/reset-password", post(reset_password))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "post": {
                        "summary": "Register a user",
                        "tags": ["Users"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Registration" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "User registered",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/UserResponse" }
                                    }
                                }
                            },
                            "400": { "$ref": "#/components/responses/Error" },
                            "409": { "$ref": "#/components/responses/Error" },
                            "500": { "$ref": "#/components/responses/Error" }
                        }
                    }
                },
                "/{email}/reset-password": {
                    "post": {
                        "summary": "Replace a user's password",
                        "tags": ["Users"],
                        "parameters": [{
                            "name": "email",
                            "in": "path",
                            "required": true,
                            "schema": { "type": "string", "format": "email" }
                        }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/PasswordReset" }
                                }
                            }
                        },
                        "responses": {
                            "200": {
                                "description": "Password replaced",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/UserResponse" }
                                    }
                                }
                            },
                            "400": { "$ref": "#/components/responses/Error" },
                            "404": { "$ref": "#/components/responses/Error" },
                            "500": { "$ref": "#/components/responses/Error" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Registration": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string" }
                        },
                        "required": ["email", "password"],
                        "additionalProperties": false
                    },
                    "PasswordReset": {
                        "type": "object",
                        "properties": {
                            "newPassword": { "type": "string" },
                            "securityQuestions": {
                                "type": "array",
                                "items": { "type": "object" },
                                "description": "Accepted but not checked"
                            }
                        },
                        "required": ["newPassword"],
                        "additionalProperties": false
                    },
                    "UserResponse": {
                        "type": "object",
                        "properties": {
                            "message": { "type": "string" },
                            "user": {
                                "type": "object",
                                "properties": {
                                    "email": { "type": "string", "format": "email" }
                                },
                                "required": ["email"]
                            }
                        },
                        "required": ["message", "user"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

fn store_failure(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::not_found(USER_NOT_FOUND),
        StoreError::Duplicate => AppError::conflict(CONFLICT),
        StoreError::Backend(err) => AppError::Internal(err),
    }
}

async fn register_user(
    State(state): State<UsersState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let registration: Registration = Registration::SCHEMA
        .parse(payload)
        .map_err(|details| AppError::invalid(BAD_REQUEST, details))?;

    match state.users.find_one(&registration.email).await {
        Ok(_) => return Err(AppError::conflict(CONFLICT)),
        Err(StoreError::NotFound) => {}
        Err(err) => return Err(store_failure(err)),
    }

    let user = User {
        email: registration.email,
        password: state.hasher.hash(registration.password).await?,
    };
    let view = UserView::from(&user);

    // A concurrent registration can still win between lookup and insert;
    // the collection reports that as a duplicate.
    state.users.insert_one(user).await.map_err(store_failure)?;
    tracing::info!(email = %view.email, "user registered");

    Ok(Json(UserResponse {
        message: REGISTERED,
        user: view,
    }))
}

async fn reset_password(
    State(state): State<UsersState>,
    Path(email): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let reset: PasswordReset = PasswordReset::SCHEMA
        .parse(payload)
        .map_err(|details| AppError::invalid(BAD_REQUEST, details))?;

    state.users.find_one(&email).await.map_err(store_failure)?;

    let password_hash = state.hasher.hash(reset.new_password).await?;
    let user = state
        .users
        .update_one(&email, PasswordChange { password_hash })
        .await
        .map_err(store_failure)?;
    tracing::info!(email = %user.email, "password reset");

    Ok(Json(UserResponse {
        message: PASSWORD_RESET,
        user: UserView::from(&user),
    }))
}

/// Create a new instance of the users module
pub fn create_module(users: UserCollection, hasher: PasswordHasher) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(users, hasher))
}
