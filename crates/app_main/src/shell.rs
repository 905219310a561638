//! Line-based front end over a [`BrowseSession`]
//!
//! Each input line is either a shell word (`open`, `save`, `list`, ...) or a
//! key name resolved through the configured key map (`Right`, `?`, `F1`).

use anyhow::Result;
use app_core::{
    AppConfig, BrowseSession, Command, CommandDispatcher, CommandId, Dialogs, SessionEvent,
    SessionState,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

const USAGE: &str = "\
open [dir]     browse a folder
bookmarks      browse bookmarked images
save [dir]     copy bookmarked images to a folder
select <n>     select image n
list           list the current view
delete         delete the selected image
help           show key bindings
quit           exit
Any other word is looked up as a key (Left, Right, ?, Delete, F1).";

/// Dialogs answered on the terminal
struct TerminalDialogs;

impl TerminalDialogs {
    fn prompt(&self, text: &str) -> Option<String> {
        print!("{} ", text);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Dialogs for TerminalDialogs {
    fn pick_folder(&self, title: &str) -> Option<PathBuf> {
        self.prompt(&format!("{}:", title))
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    fn confirm(&self, title: &str, message: &str) -> bool {
        self.prompt(&format!("[{}] {} [y/N]", title, message))
            .map(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false)
    }

    fn show_message(&self, title: &str, message: &str) {
        if message.contains('\n') {
            println!("[{}]\n{}", title, message);
        } else {
            println!("[{}] {}", title, message);
        }
    }

    fn show_error(&self, title: &str, message: &str) {
        eprintln!("[{}] {}", title, message);
    }
}

pub fn run(config: &AppConfig) -> Result<()> {
    let mut session = BrowseSession::from_config(config);
    let dispatcher = CommandDispatcher::new(config);
    let dialogs = TerminalDialogs;

    println!("PhotoSelect. Type 'help' for commands.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, Some(arg.trim())),
            None => (line, None),
        };

        let cmd = match word {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{}\n", USAGE);
                Command::new(CommandId::APP_HELP)
            }
            "list" => {
                print_list(&session);
                continue;
            }
            "select" => {
                let selected = arg
                    .and_then(|a| a.parse::<usize>().ok())
                    .filter(|&n| n > 0)
                    .map(|n| session.select(n - 1))
                    .unwrap_or(false);
                if selected {
                    print_selection(&session);
                } else {
                    eprintln!("No image {}", arg.unwrap_or(""));
                }
                continue;
            }
            "open" => with_optional_path(CommandId::FILE_BROWSE_FOLDER, arg),
            "bookmarks" => Command::new(CommandId::FILE_BROWSE_BOOKMARKS),
            "save" => with_optional_path(CommandId::FILE_SAVE, arg),
            "delete" => Command::new(CommandId::FILE_DELETE),
            key => match dispatcher.keymap().resolve(key) {
                Some(cmd) => cmd,
                None => {
                    eprintln!("Unknown command or key: {}", key);
                    continue;
                }
            },
        };

        let before = session.selected();
        dispatcher.execute(&mut session, &dialogs, &cmd);

        if session.state() == SessionState::Loading {
            wait_with_progress(&mut session);
        } else if session.selected() != before || cmd.id.as_str() == CommandId::META_TOGGLE_BOOKMARK {
            print_selection(&session);
        }
    }

    Ok(())
}

fn with_optional_path(id: &str, arg: Option<&str>) -> Command {
    match arg.filter(|a| !a.is_empty()) {
        Some(path) => Command::new(id).with_path(path),
        None => Command::new(id),
    }
}

fn wait_with_progress(session: &mut BrowseSession) {
    loop {
        for event in session.poll_load() {
            match event {
                SessionEvent::Progress(p) => {
                    print!("\rLoading {}/{}", p.loaded, p.total);
                    let _ = io::stdout().flush();
                }
                SessionEvent::DecodeSkipped { path, error } => {
                    println!("\rSkipped {}: {}", path.display(), error.user_message());
                }
                SessionEvent::Ready { files, bookmarked, skipped } => {
                    println!("\r{} images, {} bookmarked, {} unreadable", files, bookmarked, skipped);
                    return;
                }
                SessionEvent::LoadFailed(e) => {
                    eprintln!("\r{}", e.user_message());
                    return;
                }
                SessionEvent::LoadCancelled => {
                    println!("\rLoad cancelled");
                    return;
                }
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn print_list(session: &BrowseSession) {
    if session.files().is_empty() {
        println!("(no images)");
        return;
    }

    for (i, file) in session.files().iter().enumerate() {
        let cursor = if session.selected() == Some(i) { '>' } else { ' ' };
        let star = if session.bookmarks().contains(i) { '*' } else { ' ' };
        println!("{}{} {:>4}  {}", cursor, star, i + 1, file.name);
    }

    let queued = session.queued_for_save().len();
    if queued > 0 {
        println!("{} images queued for save", queued);
    }
}

fn print_selection(session: &BrowseSession) {
    let (Some(index), Some(file)) = (session.selected(), session.selected_file()) else {
        return;
    };

    let star = if session.is_selected_bookmarked() { '*' } else { ' ' };
    let size = match session.preview() {
        Some(image) => format!("{}x{}", image.width, image.height),
        None => "unreadable".to_string(),
    };
    println!("[{}/{}] {} {} ({})", index + 1, session.files().len(), star, file.name, size);
}
