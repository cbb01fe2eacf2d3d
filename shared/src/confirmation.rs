use crate::types::Result;
use dialoguer::Confirm;

/// Asks the operator whether a single step may run. Escape counts as "no".
pub fn confirm_step(description: &str) -> Result<bool> {
    let choice = Confirm::new()
        .with_prompt(format!("Execute \"{description}\"?"))
        .default(false)
        .show_default(true)
        .interact_opt()?;
    Ok(choice.unwrap_or(false))
}
