use clap::{Parser, Subcommand};

use beautyroom_session::ProfileUpdate;

/// Inspect and drive the BeautyRoom client session stored on this machine.
#[derive(Parser, Debug)]
#[command(name = "beautyroom-session", version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the current session (after refreshing the user from the backend)
    Status,
    /// Store the session carried by a login response
    Login {
        /// Login response JSON, or @FILE to read it from a file
        #[arg(long)]
        payload: String,
    },
    /// Forget the stored session
    Logout,
    /// Send a profile update for the logged-in user
    Update(UpdateArgs),
    /// Follow session changes made by other processes until Ctrl-C
    Watch,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub direccion: Option<String>,
    #[arg(long)]
    pub notas: Option<String>,
    #[arg(long)]
    pub especialidad: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
}

impl From<UpdateArgs> for ProfileUpdate {
    fn from(args: UpdateArgs) -> Self {
        ProfileUpdate {
            name: args.name,
            email: args.email,
            phone: args.phone,
            telefono: None,
            direccion: args.direccion,
            notas: args.notas,
            especialidad: args.especialidad,
            status: args.status,
        }
    }
}
