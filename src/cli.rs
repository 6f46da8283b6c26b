//! Administrative commands.

use dialoguer::{Input, Password};

use edulife_models::users::{RegisterDto, User, UserRole};

use crate::state::AppState;

/// Creates a super admin account, prompting for anything not supplied.
pub async fn create_superadmin(
    state: &AppState,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<User> {
    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let user = state
        .auth
        .register(
            RegisterDto {
                email: Some(email),
                phone: None,
                password,
            },
            UserRole::SuperAdmin,
        )
        .await
        .map_err(edulife_core::AppError::from)?;
    Ok(user)
}
