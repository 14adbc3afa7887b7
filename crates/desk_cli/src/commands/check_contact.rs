//! Check-contact command - Validate intake fields locally.

use anyhow::Result;
use clap::Args;

use desk_chat::ChatError;

use super::ContactArgs;

#[derive(Args)]
pub struct CheckContactArgs {
    #[command(flatten)]
    contact: ContactArgs,
}

pub async fn execute(args: CheckContactArgs) -> Result<()> {
    println!("📋 Checking contact details...");

    match args.contact.to_form().submit() {
        Ok(contact) => {
            println!("   ✅ Name: {}", contact.name);
            println!("   ✅ Email: {}", contact.email);
            if let Some(ref request) = contact.request {
                println!("   ✅ Request: {}", request);
            }
            Ok(())
        }
        Err(errors) => {
            for (field, message) in errors.iter() {
                println!("   ❌ {}: {}", field.as_str(), message);
            }
            Err(ChatError::Validation(errors).into())
        }
    }
}
