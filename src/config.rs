use std::env;

pub struct Config {
    pub engine_api_url: String,
    pub listen_addr: String,
    pub frontend_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok(); // Load .env file

        let engine_api_url = env::var("ENGINE_API_URL").expect("ENGINE_API_URL must be set");

        let listen_addr =
            env::var("LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

        let frontend_origin = env::var("FRONTEND_ORIGIN").expect("FRONTEND_ORIGIN must be set");

        Config {
            engine_api_url,
            listen_addr,
            frontend_origin,
        }
    }
}
