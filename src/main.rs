// src/main.rs

mod app_state;
mod attendance;
mod auth;
mod classes;
mod codec;
mod config;
mod db;
mod errors;
mod lifecycle;
mod models;
mod roster;
mod stats;
mod users;

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures::future::{ok, Ready};
use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::app_state::AppState;
use crate::attendance::{
    class_stats, mark_self_present, save_attendance, session_history, start_session,
    student_stats, today_session,
};
use crate::auth::{login, signup, Claims};
use crate::classes::{create_class, get_class, get_roster, list_classes};
use crate::users::{find_user_email, get_me};

#[derive(Debug)]
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware { service })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Extract "Bearer <token>" from the Authorization header if present
        if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if auth_str.starts_with("Bearer ") {
                    let token = auth_str.trim_start_matches("Bearer ").trim().to_string();
                    let secret = req
                        .app_data::<web::Data<AppState>>()
                        .map(|data| data.config.jwt_secret.clone())
                        .unwrap_or_default();
                    match verify_token(&token, &secret) {
                        Ok(user_id) => {
                            // Insert user_id as a string extension
                            req.extensions_mut().insert(user_id);
                        }
                        Err(e) => {
                            let (req_parts, _payload) = req.into_parts();
                            let resp = HttpResponse::Unauthorized()
                                .body(format!("Invalid token: {}", e))
                                .map_into_boxed_body();
                            let srv_resp = ServiceResponse::new(req_parts, resp);
                            return Box::pin(async move { Ok(srv_resp) });
                        }
                    }
                }
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

fn verify_token(token: &str, secret: &str) -> Result<String, String> {
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    ) {
        Ok(token_data) => Ok(token_data.claims.sub),
        Err(e) => Err(format!("Token decode error: {}", e)),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);

    let frontend_origin =
        env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    println!("Server running at http://0.0.0.0:8080");
    println!("Allowed CORS Origin: {}", frontend_origin);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication)
            .app_data(web::Data::new(AppState {
                mongodb: mongodb.clone(),
                config: config.clone(),
            }))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(signup))
                    .route("/login", web::post().to(login)),
            )
            .service(
                web::scope("/users")
                    .route("/me", web::get().to(get_me))
                    .route("/search", web::get().to(find_user_email)),
            )
            .service(
                web::scope("/classes")
                    .route("", web::post().to(create_class))
                    .route("", web::get().to(list_classes))
                    .service(
                        web::scope("/{class_id}")
                            .route("", web::get().to(get_class))
                            .route("/students", web::get().to(get_roster))
                            .service(
                                web::scope("/attendance")
                                    .route("", web::put().to(save_attendance))
                                    .route("/start", web::post().to(start_session))
                                    .route("/mark", web::post().to(mark_self_present))
                                    .route("/today", web::get().to(today_session))
                                    .route("/history", web::get().to(session_history))
                                    .route("/stats", web::get().to(class_stats))
                                    .route("/stats/{student_id}", web::get().to(student_stats)),
                            ),
                    ),
            )
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::verify_token;
    use crate::auth::create_jwt;

    #[test]
    fn verify_token_accepts_only_the_configured_secret() {
        let token = create_jwt("u1", "topsecret").unwrap();
        assert_eq!(verify_token(&token, "topsecret").unwrap(), "u1");
        assert!(verify_token(&token, "other").is_err());
        assert!(verify_token(&token, "").is_err());
    }
}
