use std::env;

#[derive(Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    /// Default length of an attendance window when the teacher does not pick one.
    pub session_duration_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let session_duration_minutes = env::var("SESSION_DURATION_MINUTES")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        Self {
            mongo_uri: env::var("MONGO_URI").expect("MONGO_URI must be set"),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "orbit".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            session_duration_minutes,
        }
    }
}
