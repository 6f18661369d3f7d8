//! People display formatting
//!
//! Formats fund members for terminal output in table and detail views.

use crate::models::{Money, Person};

/// Format people with their balances as a table
pub fn format_people_list(people: &[&Person], currency_symbol: &str) -> String {
    if people.is_empty() {
        return "No people found.".to_string();
    }

    let name_width = people
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(5);

    let email_width = people
        .iter()
        .map(|p| p.email.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<email_width$}  {:>12}  {}\n",
        "Name",
        "Email",
        "Balance",
        "Status",
        name_width = name_width,
        email_width = email_width,
    ));

    let separator = format!(
        "{:-<name_width$}  {:-<email_width$}  {:->12}  {:-<8}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
        email_width = email_width,
    );
    output.push_str(&separator);

    for person in people {
        output.push_str(&format!(
            "{:<name_width$}  {:<email_width$}  {:>12}  {}\n",
            person.name,
            person.email,
            person.balance.format_with_symbol(currency_symbol),
            status(person),
            name_width = name_width,
            email_width = email_width,
        ));
    }

    let total: Money = people.iter().map(|p| p.balance).sum();

    output.push_str(&separator);
    output.push_str(&format!(
        "{:<name_width$}  {:<email_width$}  {:>12}\n",
        "TOTAL",
        "",
        total.format_with_symbol(currency_symbol),
        name_width = name_width,
        email_width = email_width,
    ));

    output
}

/// Format a single person's details
pub fn format_person_details(person: &Person, currency_symbol: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Person: {}\n", person.name));
    output.push_str(&format!("  Email:   {}\n", person.email));
    output.push_str(&format!(
        "  Balance: {}\n",
        person.balance.format_with_symbol(currency_symbol)
    ));
    output.push_str(&format!("  Status:  {}\n", status(person)));
    output
}

fn status(person: &Person) -> &'static str {
    if person.is_owed() {
        "owed"
    } else if person.owes() {
        "owes"
    } else {
        "settled"
    }
}
