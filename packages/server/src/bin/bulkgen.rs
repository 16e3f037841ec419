//! Bulk-load generator: writes RESP commands to stdout for `redis-cli --pipe`.
//!
//! Run with:
//! ```not_rust
//! # one command per stdin line, arguments separated by whitespace
//! printf 'SET greeting hello\nSADD colors red blue\n' | cargo run --bin agora-bulkgen | redis-cli --pipe
//!
//! # a room of guest users under the server's key scheme
//! cargo run --bin agora-bulkgen -- seed --users 100 --room lobby | redis-cli --pipe
//! ```

use std::{
    collections::BTreeSet,
    io::{self, BufRead, BufWriter, Write},
};

use agora_server::{
    domain::{ClientId, Group, Room, RoomName, User},
    infrastructure::{
        directory::inmemory::DEFAULT_GROUP,
        persistence::bulk::{self, Command},
        store::resp::encode_command,
    },
};
use agora_shared::logger::setup_stderr_logger;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agora-bulkgen")]
#[command(about = "Generate RESP mass-insert input", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Encode whitespace-separated commands read from stdin (the default)
    Raw,
    /// Generate guest users that are all members of one room
    Seed {
        /// Number of guest users
        #[arg(long, default_value_t = 10)]
        users: usize,

        /// Room the users join
        #[arg(long, default_value = "lobby")]
        room: String,

        /// Group owning the room
        #[arg(long, default_value = DEFAULT_GROUP)]
        group: String,
    },
}

fn encode_stdin(out: &mut impl Write) -> io::Result<usize> {
    let mut count = 0;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let args: Vec<&str> = line.split_whitespace().collect();
        if args.is_empty() {
            continue;
        }
        out.write_all(encode_command(&args).as_bytes())?;
        count += 1;
    }
    Ok(count)
}

fn seed_commands(users: usize, room: &RoomName, group: &str) -> Vec<Command> {
    let ids: BTreeSet<ClientId> = (0..users).map(|_| ClientId::generate()).collect();

    let mut commands = Vec::new();
    for id in &ids {
        let mut user = User::guest(*id);
        user.connected = false;
        user.rooms.insert(room.as_str().to_string());
        user.groups.insert(group.to_string());
        commands.extend(bulk::user_commands(&user));
    }
    commands.extend(bulk::room_commands(&Room {
        title: room.as_str().to_string(),
        group: group.to_string(),
        private: false,
        members: ids.clone(),
    }));
    commands.extend(bulk::group_commands(&Group {
        title: group.to_string(),
        rooms: BTreeSet::from([room.as_str().to_string()]),
        users: ids,
    }));
    commands
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_stderr_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let mut out = BufWriter::new(io::stdout().lock());

    let count = match args.command.unwrap_or(Mode::Raw) {
        Mode::Raw => encode_stdin(&mut out)?,
        Mode::Seed { users, room, group } => {
            let room = RoomName::new(&room)?;
            let commands = seed_commands(users, &room, &group);
            for command in &commands {
                out.write_all(encode_command(command).as_bytes())?;
            }
            commands.len()
        }
    };
    out.flush()?;

    tracing::info!("Encoded {} command(s)", count);
    Ok(())
}
