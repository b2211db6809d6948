use clap::Subcommand;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cli::client::PortalClient;
use crate::cli::utils::{output_data, output_success, output_table};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "List applicants, optionally filtered by name or email")]
    List {
        #[arg(long, help = "Case-insensitive search term")]
        search: Option<String>,
    },

    #[command(about = "Create an applicant under the signed-in admin")]
    Create {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, env = "PORTAL_USER_PASSWORD", hide_env_values = true, help = "Initial password")]
        password: String,
        #[arg(long, help = "Display name")]
        full_name: Option<String>,
    },

    #[command(about = "Show one applicant's application")]
    Show {
        #[arg(help = "Applicant id")]
        id: Uuid,
        #[arg(long, help = "Print layout instead of raw sections")]
        print: bool,
    },

    #[command(about = "Delete an applicant and all of their records")]
    Delete {
        #[arg(help = "Applicant id")]
        id: Uuid,
    },
}

pub async fn handle(cmd: UsersCommands, server: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let (client, _) = PortalClient::authenticated(server)?;

    match cmd {
        UsersCommands::List { search } => {
            let path = match search {
                Some(term) => format!("/api/admin/users?search={}", url::form_urlencoded::byte_serialize(term.as_bytes()).collect::<String>()),
                None => "/api/admin/users".to_string(),
            };
            let users = client.get(&path).await?;
            let rows = users.as_array().cloned().unwrap_or_default();
            output_table(output_format, &rows, &["id", "full_name", "email"], "No applicants")
        }
        UsersCommands::Create { email, password, full_name } => {
            let created = client
                .post("/api/admin/users", &json!({ "email": email, "password": password, "full_name": full_name }))
                .await?;
            output_success(
                output_format,
                &format!("Created applicant {} ({})", created["full_name"].as_str().unwrap_or_default(), created["id"].as_str().unwrap_or_default()),
                Some(created),
            )
        }
        UsersCommands::Show { id, print } => {
            let path = if print { format!("/api/admin/users/{}?print=true", id) } else { format!("/api/admin/users/{}", id) };
            let detail = client.get(&path).await?;
            if output_format != OutputFormat::Text || !print {
                return output_data(output_format, &detail);
            }
            print_layout(&detail);
            Ok(())
        }
        UsersCommands::Delete { id } => {
            client.delete(&format!("/api/admin/users/{}", id)).await?;
            output_success(output_format, &format!("Deleted applicant {}", id), Some(json!({ "id": id })))
        }
    }
}

fn print_layout(detail: &Value) {
    let empty = Vec::new();
    if let Some(name) = detail["print"]["applicant"].as_str() {
        println!("{}\n", name);
    }
    for tab in detail["print"]["tabs"].as_array().unwrap_or(&empty) {
        println!("== {} ==", tab["title"].as_str().unwrap_or_default());
        for section in tab["sections"].as_array().unwrap_or(&empty) {
            let blocks = section["blocks"].as_array().unwrap_or(&empty);
            println!("-- {} --", section["title"].as_str().unwrap_or_default());
            if blocks.is_empty() {
                println!("   No entries");
            }
            for block in blocks {
                println!("   [{}]", block["heading"].as_str().unwrap_or_default());
                for field in block["fields"].as_array().unwrap_or(&empty) {
                    let value = field["value"].as_str().filter(|v| !v.is_empty()).unwrap_or("-");
                    println!("   {:<40} {}", field["label"].as_str().unwrap_or_default(), value);
                }
            }
        }
        println!();
    }
}
