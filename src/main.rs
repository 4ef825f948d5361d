//! IDHub identity provider entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Open the Redis challenge store
//! 3. Wire the authenticator (store, ecrecover, JWT signer)
//! 4. Build router + security headers middleware
//! 5. Start Axum server
//!
//! Also supports `keygen` and `sign` subcommands for exercising the login
//! flow by hand.

use idhub::{
    auth::{
        verify::{address_of, sign_personal_message},
        AppState, Authenticator, CookiePolicy, EcRecover, JwtSigner,
    },
    config::Config,
    middleware::security_headers,
    routes,
    storage::RedisChallengeStore,
};
use secp256k1::{PublicKey, SecretKey};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use zeroize::Zeroizing;

/// Generate a random secp256k1 key and return (private key hex, address).
fn keygen() -> Result<(String, String), String> {
    let mut seed = Zeroizing::new([0u8; 32]);
    rand::fill(&mut seed[..]);

    let secret = SecretKey::from_slice(&seed[..]).map_err(|e| format!("Secret key: {}", e))?;
    let address = address_of(&PublicKey::from_secret_key_global(&secret));

    Ok((hex::encode(secret.secret_bytes()), address))
}

/// Sign `message` with a hex private key, as a wallet's `personal_sign` would.
fn sign(private_key_hex: &str, message: &str) -> Result<String, String> {
    let bytes = Zeroizing::new(
        hex::decode(private_key_hex.trim_start_matches("0x"))
            .map_err(|e| format!("Private key hex: {}", e))?,
    );
    let secret = SecretKey::from_slice(&bytes).map_err(|e| format!("Secret key: {}", e))?;

    Ok(sign_personal_message(&secret, message))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  idhub                         Run the server");
    eprintln!("  idhub keygen                  Generate a test key and its address");
    eprintln!("  idhub sign <key-hex> <msg>    Sign a challenge with a test key");
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("keygen") => {
            match keygen() {
                Ok((private_key, address)) => {
                    println!("private key: {}", private_key);
                    println!("address:     {}", address);
                }
                Err(e) => {
                    eprintln!("Error generating key: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        Some("sign") => {
            if args.len() != 4 {
                print_usage();
                std::process::exit(1);
            }
            match sign(&args[2], &args[3]) {
                Ok(signature) => println!("{}", signature),
                Err(e) => {
                    eprintln!("Error signing message: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        Some(_) => {
            print_usage();
            std::process::exit(1);
        }
        None => {}
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting idhub on {}", config.bind_addr);

    // Challenge store
    let redis_client = redis::Client::open(config.redis_url.as_str()).expect("Invalid Redis URL");

    // Verify Redis connection
    redis_client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");

    let store = RedisChallengeStore::new(redis_client, config.store_timeout);

    let signer = JwtSigner::new(config.jwt_secret.clone(), config.token_issuer.clone())
        .expect("Invalid JWT signer configuration");

    let authenticator = Authenticator::new(Arc::new(store), Arc::new(EcRecover), Arc::new(signer))
        .with_subject(config.token_subject.clone());

    let state = AppState {
        auth: Arc::new(authenticator),
        cookies: CookiePolicy::new(config.cookie_secure),
    };

    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    // CorsLayer::new() with no allowed origins rejects all CORS preflight requests.
    let cors = CorsLayer::new();

    let app = routes::api_router()
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
