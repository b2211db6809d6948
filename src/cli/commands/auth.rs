use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::client::PortalClient;
use crate::cli::config::{self, StoredSession};
use crate::cli::utils::{output_data, output_success};
use crate::cli::OutputFormat;
use crate::session::Role;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in and remember the session")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true, help = "Password")]
        password: String,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show the signed-in profile")]
    Whoami,

    #[command(about = "Register a new admin account")]
    RegisterAdmin {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true, help = "Password")]
        password: String,
        #[arg(long, default_value = "", help = "Display name (defaults to the email's local part)")]
        full_name: String,
    },
}

pub async fn handle(cmd: AuthCommands, server: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let client = PortalClient::anonymous(server)?;
            let data = client.post("/auth/login", &json!({ "email": email, "password": password })).await?;

            let token = data["access_token"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("Login response carried no access token"))?;
            let role: Option<Role> = serde_json::from_value(data["profile"]["role"].clone()).ok();
            config::save_session(&StoredSession::new(client.server().to_string(), email.clone(), token.to_string(), role))?;

            let message = match role {
                Some(role) => format!("Logged in as {} ({})", email, role),
                None => format!("Logged in as {} (no portal profile)", email),
            };
            output_success(output_format, &message, Some(json!({ "home": data["home"], "profile": data["profile"] })))
        }
        AuthCommands::Logout => {
            let message = if config::clear_session()? { "Logged out" } else { "No stored session" };
            output_success(output_format, message, None)
        }
        AuthCommands::Whoami => {
            let (client, session) = PortalClient::authenticated(server)?;
            let data = client.get("/api/whoami").await?;
            if output_format != OutputFormat::Text {
                return output_data(output_format, &data);
            }
            println!("Server: {}", client.server());
            println!("Email:  {}", data["email"].as_str().unwrap_or(&session.email));
            println!("Role:   {}", data["role"].as_str().unwrap_or("-"));
            println!("Name:   {}", data["full_name"].as_str().unwrap_or("-"));
            if let Some(admin_id) = data["admin_id"].as_str() {
                println!("Admin:  {}", admin_id);
            }
            Ok(())
        }
        AuthCommands::RegisterAdmin { email, password, full_name } => {
            let client = PortalClient::anonymous(server)?;
            let profile: Value = client
                .post("/auth/register", &json!({ "email": email, "password": password, "full_name": full_name }))
                .await?;
            output_success(
                output_format,
                &format!("Registered admin {} ({})", email, profile["full_name"].as_str().unwrap_or_default()),
                Some(profile),
            )
        }
    }
}
