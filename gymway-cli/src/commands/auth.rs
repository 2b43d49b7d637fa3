//! Account commands: register, sign in, email verification and sign out.

use clap::{Args, Subcommand};
use tokio::task::JoinHandle;

use gymway_core::{AuthState, AuthViewModel, HttpIdentityClient, IdentityProvider, Role};

use super::{password_or_prompt, prompt};
use crate::config::save_session;
use crate::context::Context;
use crate::error::CliError;

/// Authentication commands
#[derive(Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Subcommand)]
enum AuthSubcommand {
    /// Create an account
    Register {
        /// Email address
        email: String,

        /// Display name (prompted if omitted)
        #[arg(long, short)]
        name: Option<String>,

        /// Role (athlete, coach)
        #[arg(long, short, default_value = "athlete")]
        role: String,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in
    Login {
        /// Email address
        email: String,

        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the signed-in user and verification state
    Status,
    /// Check whether the email address has been verified
    Verify,
    /// Send the verification email again
    Resend,
    /// Sign out and forget the saved session
    Logout,
}

impl AuthCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), CliError> {
        let view = ctx.auth_view();

        match &self.command {
            AuthSubcommand::Register {
                email,
                name,
                role,
                password,
            } => {
                let role: Role = role.parse().map_err(CliError::Failed)?;
                let name = match name {
                    Some(n) => n.clone(),
                    None => prompt("Display name: ")?,
                };
                let password = password_or_prompt(password)?;

                let handle = view.register(email, &password, &name, role)?;
                match settle(&view, handle).await? {
                    AuthState::NeedEmailVerification => {
                        persist_session(ctx)?;
                        println!("Registered {} as {}.", email, role);
                        println!("Check your inbox and open the verification link,");
                        println!("then run 'gym auth verify'.");
                        Ok(())
                    }
                    other => Err(unexpected(other)),
                }
            }

            AuthSubcommand::Login { email, password } => {
                let password = password_or_prompt(password)?;

                let handle = view.login(email, &password);
                match settle(&view, handle).await? {
                    AuthState::Success(uid) => {
                        persist_session(ctx)?;
                        println!("Signed in as {} ({})", email, uid);
                        Ok(())
                    }
                    AuthState::NeedEmailVerification => {
                        // Kept so verify and resend can reach the server.
                        persist_session(ctx)?;
                        println!("Your email address is not verified yet.");
                        println!("Open the link we sent you, then run 'gym auth verify'.");
                        println!("Run 'gym auth resend' to get a new link.");
                        Ok(())
                    }
                    other => Err(unexpected(other)),
                }
            }

            AuthSubcommand::Status => {
                println!("Server: {}", ctx.config.server_url.value);
                let Some(uid) = ctx.identity.current_uid() else {
                    println!("Status: not signed in");
                    return Ok(());
                };

                println!("User:   {}", uid);
                match ctx.identity.check_email_verified().await {
                    Ok(true) => println!("Email:  verified"),
                    Ok(false) => println!("Email:  not verified"),
                    Err(e) => println!("Email:  unknown ({})", e),
                }
                Ok(())
            }

            AuthSubcommand::Verify => {
                ctx.require_uid()?;
                let handle = view.check_email_verification();
                match settle(&view, handle).await? {
                    AuthState::Success(uid) => {
                        println!("Email verified. Signed in as {}.", uid);
                        Ok(())
                    }
                    other => Err(unexpected(other)),
                }
            }

            AuthSubcommand::Resend => {
                ctx.require_uid()?;
                let handle = view.resend_verification_email();
                match settle(&view, handle).await? {
                    AuthState::NeedEmailVerification => {
                        println!("Verification email sent.");
                        Ok(())
                    }
                    other => Err(unexpected(other)),
                }
            }

            AuthSubcommand::Logout => {
                settle(&view, view.sign_out()).await?;
                save_session(&ctx.config.config_path, None)?;
                println!("Signed out.");
                Ok(())
            }
        }
    }
}

/// Waits for an auth action and returns the state it left behind.
async fn settle(
    view: &AuthViewModel<HttpIdentityClient>,
    handle: JoinHandle<()>,
) -> Result<AuthState, CliError> {
    handle.await?;
    Ok(view.current_state())
}

fn unexpected(state: AuthState) -> CliError {
    match state {
        AuthState::Error(message) => CliError::Failed(message),
        other => CliError::Failed(format!("Unexpected state: {}", other)),
    }
}

fn persist_session(ctx: &Context) -> Result<(), CliError> {
    match ctx.identity.session() {
        Some(session) => {
            save_session(&ctx.config.config_path, Some(&session))?;
            tracing::debug!("Saved session to {}", ctx.config.config_path.display());
            Ok(())
        }
        None => Err(CliError::NotSignedIn),
    }
}
