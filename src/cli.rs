use serde::Deserialize;
use std::fs;

use crate::models::{Bag, BagLocation, Member};
use crate::store::Stores;
use crate::store::auth::owner_account;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRecord {
    name: String,
    #[serde(default)]
    membership_id: Option<String>,
    bag_number: String,
    #[serde(default)]
    location: Option<BagLocation>,
    #[serde(default)]
    notes: Option<String>,
}

/// Import member + bag pairs from a JSON array into the partition of
/// `account_id`. Records without a name or bag number are skipped.
pub async fn import_bags(stores: &Stores, file_path: &str, account_id: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let Some(account) = stores.auth.find_account(account_id) else {
        return Err(format!("Account with ID '{}' not found", account_id).into());
    };
    let user = account.user_id();

    let content = fs::read_to_string(file_path)?;
    let records: Vec<ImportRecord> = serde_json::from_str(&content)?;

    let mut imported = 0;
    for record in records {
        let name = record.name.trim();
        let bag_number = record.bag_number.trim();
        if name.is_empty() || bag_number.is_empty() {
            eprintln!("Skipping record without name or bag number");
            continue;
        }

        let member = Member::new(
            name.to_string(),
            record.membership_id.unwrap_or_default().trim().to_string(),
        );
        let mut bag = Bag::new(
            member.id.clone(),
            bag_number.to_string(),
            record.location.unwrap_or(BagLocation::Bagroom),
            stores.clock.now(),
        );
        bag.notes = record.notes.filter(|n| !n.trim().is_empty());

        stores.bags.add_member(&user, member);
        stores.bags.add_bag(&user, bag);
        imported += 1;
    }

    stores.persister.flush().await;
    println!("Imported {} bags into {}", imported, account.club_name);
    Ok(imported)
}

pub async fn create_club_account(
    stores: &Stores,
    email: &str,
    username: &str,
    password: &str,
    club_name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if !stores
        .auth
        .create_club_account(&owner_account(), email, username, password, club_name)
    {
        return Err(format!("Could not create account '{}': username taken or missing fields", username).into());
    }
    stores.persister.flush().await;

    let Some(club) = stores
        .auth
        .club_accounts()
        .into_iter()
        .find(|a| a.username == username)
    else {
        return Err("Account vanished after creation".into());
    };

    println!("Created club account:");
    println!("  ID: {}", club.id);
    println!("  Club: {}", club.club_name);
    println!("  Trial ends: {}", club.trial_ends().to_rfc3339());

    Ok(())
}
