//! The interactive session: a login loop that routes authenticated users to
//! the account-holder menu, and the administrator to the directory-management
//! menu.
//!
//! The driver is generic over its input and output so tests can script a
//! whole session against an in-memory console and assert on everything it
//! printed. Menu selections parse into command enums dispatched by
//! exhaustive matches; unrecognized selections re-prompt rather than
//! terminate. The session ends when the input runs out.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::warn;

use crate::chart;
use crate::directory::{Directory, ADMIN_USER};
use crate::Error;

const SEPARATOR: &str = "----------------------------------";

/// Account-holder menu, one variant per numbered option.
#[derive(Debug, Clone, Copy)]
enum AccountAction {
    CheckBalance,
    Withdraw,
    Deposit,
    ChangePin,
    Exit,
}

impl AccountAction {
    fn from_option(option: i64) -> Option<Self> {
        match option {
            1 => Some(Self::CheckBalance),
            2 => Some(Self::Withdraw),
            3 => Some(Self::Deposit),
            4 => Some(Self::ChangePin),
            5 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Administrator menu, one variant per numbered option.
#[derive(Debug, Clone, Copy)]
enum AdminAction {
    AddUser,
    DeleteUser,
    ViewBalances,
    PlotBalances,
    Exit,
}

impl AdminAction {
    fn from_option(option: i64) -> Option<Self> {
        match option {
            1 => Some(Self::AddUser),
            2 => Some(Self::DeleteUser),
            3 => Some(Self::ViewBalances),
            4 => Some(Self::PlotBalances),
            5 => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Why a menu loop returned: the user picked Exit (back to the login
/// prompt), or the input ran out entirely.
enum MenuOutcome {
    LoggedOut,
    EndOfInput,
}

struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Writes `text` without a trailing newline, flushes, and reads one
    /// input line with its line terminator removed. Any other whitespace is
    /// kept: usernames and PINs match exactly as typed, and numeric entries
    /// trim at their parse site instead. `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>, Error> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn say(&mut self, line: &str) -> Result<(), Error> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }
}

/// Runs the whole interactive session against the given directory: prompts
/// for credentials until the input ends, routing each authenticated login to
/// its menu. `chart_path` is where the admin's balance chart is written.
///
/// # Errors
/// Returns an error only for non-recoverable failures (the store or the
/// console becoming unusable); every validation failure is reported to the
/// output and the session keeps going.
pub fn run<R, W>(
    directory: &mut Directory,
    input: R,
    output: W,
    chart_path: &Path,
) -> Result<(), Error>
where
    R: BufRead,
    W: Write,
{
    let mut console = Console { input, output };

    loop {
        let Some(username) = console.prompt("Enter your username: ")? else {
            return Ok(());
        };
        let Some(pin) = console.prompt("Enter your 4 digit ATM Pin: ")? else {
            return Ok(());
        };

        if !directory.authenticate(&username, &pin) {
            warn!(user = %username, "failed login attempt");
            console.say("Invalid username or PIN. Try again.")?;
            continue;
        }

        let outcome = if username == ADMIN_USER {
            admin_menu(directory, &mut console, chart_path)?
        } else {
            account_menu(directory, &mut console, &username)?
        };
        match outcome {
            MenuOutcome::LoggedOut => continue,
            MenuOutcome::EndOfInput => return Ok(()),
        }
    }
}

fn account_menu<R, W>(
    directory: &mut Directory,
    console: &mut Console<R, W>,
    username: &str,
) -> Result<MenuOutcome, Error>
where
    R: BufRead,
    W: Write,
{
    loop {
        console.say("\n1 = Check Balance")?;
        console.say("2 = Withdraw Money")?;
        console.say("3 = Deposit Money")?;
        console.say("4 = Change PIN")?;
        console.say("5 = Exit")?;

        let Some(selection) = console.prompt("Choose any option above: ")? else {
            return Ok(MenuOutcome::EndOfInput);
        };
        let option: i64 = match selection.trim().parse() {
            Ok(option) => option,
            Err(_) => {
                console.say("Please choose a valid option")?;
                continue;
            }
        };
        let Some(action) = AccountAction::from_option(option) else {
            console.say("Invalid option. Please choose a valid option.")?;
            continue;
        };

        match action {
            AccountAction::CheckBalance => match directory.balance(username) {
                Ok(balance) => {
                    console.say(SEPARATOR)?;
                    console.say(&format!("Your current balance is {balance}"))?;
                }
                Err(err) => report_failure(console, err)?,
            },

            AccountAction::Withdraw => {
                let Some(line) = console.prompt("Enter the Withdraw Amount: ")? else {
                    return Ok(MenuOutcome::EndOfInput);
                };
                let Ok(amount) = line.trim().parse::<i64>() else {
                    console.say("Please enter a valid amount")?;
                    continue;
                };
                match directory.withdraw(username, amount) {
                    Ok(balance) => {
                        console.say(SEPARATOR)?;
                        console.say(&format!("{amount} is debited from your account"))?;
                        console.say(&format!("Your current balance is {balance}"))?;
                    }
                    Err(err) => report_failure(console, err)?,
                }
            }

            AccountAction::Deposit => {
                let Some(line) = console.prompt("Enter the Deposit Amount: ")? else {
                    return Ok(MenuOutcome::EndOfInput);
                };
                let Ok(amount) = line.trim().parse::<i64>() else {
                    console.say("Please enter a valid amount")?;
                    continue;
                };
                match directory.deposit(username, amount) {
                    Ok(balance) => {
                        console.say(SEPARATOR)?;
                        console.say(&format!("{amount} is credited to your account"))?;
                        console.say(&format!("Your current balance is {balance}"))?;
                    }
                    Err(err) => report_failure(console, err)?,
                }
            }

            AccountAction::ChangePin => {
                let Some(new_pin) = console.prompt("Enter new 4 digit PIN: ")? else {
                    return Ok(MenuOutcome::EndOfInput);
                };
                match directory.change_pin(username, &new_pin) {
                    Ok(()) => console.say("PIN successfully changed")?,
                    Err(err) => report_failure(console, err)?,
                }
            }

            AccountAction::Exit => return Ok(MenuOutcome::LoggedOut),
        }
    }
}

fn admin_menu<R, W>(
    directory: &mut Directory,
    console: &mut Console<R, W>,
    chart_path: &Path,
) -> Result<MenuOutcome, Error>
where
    R: BufRead,
    W: Write,
{
    loop {
        console.say("\n1 = Add User")?;
        console.say("2 = Delete User")?;
        console.say("3 = View All Balances")?;
        console.say("4 = Plot User Balances")?;
        console.say("5 = Exit")?;

        let Some(selection) = console.prompt("Choose any option above: ")? else {
            return Ok(MenuOutcome::EndOfInput);
        };
        let option: i64 = match selection.trim().parse() {
            Ok(option) => option,
            Err(_) => {
                console.say("Please choose a valid option")?;
                continue;
            }
        };
        let Some(action) = AdminAction::from_option(option) else {
            console.say("Invalid option. Please choose a valid option.")?;
            continue;
        };

        match action {
            AdminAction::AddUser => {
                let Some(username) = console.prompt("Enter new username: ")? else {
                    return Ok(MenuOutcome::EndOfInput);
                };
                let Some(pin) = console.prompt("Enter new 4 digit PIN: ")? else {
                    return Ok(MenuOutcome::EndOfInput);
                };
                match directory.add_user(&username, &pin) {
                    Ok(()) => console.say("User added successfully")?,
                    Err(err) => report_failure(console, err)?,
                }
            }

            AdminAction::DeleteUser => {
                let Some(username) = console.prompt("Enter username to delete: ")? else {
                    return Ok(MenuOutcome::EndOfInput);
                };
                match directory.delete_user(&username) {
                    Ok(()) => console.say("User deleted successfully")?,
                    Err(err) => report_failure(console, err)?,
                }
            }

            AdminAction::ViewBalances => {
                for (username, balance) in directory.balances() {
                    console.say(&format!("{username}: {balance}"))?;
                }
            }

            AdminAction::PlotBalances => match chart::render(&directory.balances(), chart_path) {
                Ok(()) => {
                    console.say(&format!("Balance chart written to {}", chart_path.display()))?
                }
                Err(err) => report_failure(console, err)?,
            },

            AdminAction::Exit => return Ok(MenuOutcome::LoggedOut),
        }
    }
}

/// Prints recoverable failures to the console and swallows them; anything
/// else propagates and ends the session.
fn report_failure<R, W>(console: &mut Console<R, W>, err: Error) -> Result<(), Error>
where
    R: BufRead,
    W: Write,
{
    if err.is_recoverable() {
        console.say(&err.to_string())
    } else {
        Err(err)
    }
}
