//! The account directory: the in-memory user map plus the store it mirrors.
//!
//! All business rules live here - the PIN equality check, the withdrawal
//! validation chain, and the directory-management operations the
//! administrator uses. Every successful mutation rewrites the whole store
//! before returning, so the file always reflects the last completed
//! operation. Operations validate fully before touching any state; a
//! rejected request leaves both the map and the file untouched.

use std::collections::HashMap;

use tracing::info;

use crate::dto::{pin_is_valid, AccountRecord};
use crate::store::JsonStore;
use crate::Error;

/// Reserved identifier of the administrator account. It carries no balance,
/// never appears in listings or charts, and cannot be deleted.
pub const ADMIN_USER: &str = "SysAdmin";

/// Maximum amount a single withdrawal may move (the per-transaction cap).
pub const WITHDRAW_LIMIT: i64 = 1000;

pub struct Directory {
    accounts: HashMap<String, AccountRecord>,
    store: JsonStore,
}

impl Directory {
    /// Loads the directory from the given store. A store file that does not
    /// exist yet seeds the built-in default accounts and persists them
    /// immediately; any other load failure propagates.
    pub fn load(store: JsonStore) -> Result<Self, Error> {
        let accounts = match store.load()? {
            Some(accounts) => accounts,
            None => {
                let accounts = Self::default_accounts();
                store.save(&accounts)?;
                info!(path = %store.path().display(), "seeded default user store");
                accounts
            }
        };
        Ok(Self { accounts, store })
    }

    fn default_accounts() -> HashMap<String, AccountRecord> {
        HashMap::from([
            ("User1".to_string(), AccountRecord::with_balance("1234", 1000)),
            ("User2".to_string(), AccountRecord::with_balance("2222", 2000)),
            ("User3".to_string(), AccountRecord::with_balance("3333", 3000)),
            (ADMIN_USER.to_string(), AccountRecord::admin("1357")),
        ])
    }

    /// Serializes the full current directory state to the store, overwriting
    /// it. Called after every successful mutation, never speculatively.
    pub fn save(&self) -> Result<(), Error> {
        self.store.save(&self.accounts)
    }

    /// Checks a login attempt. True iff the username exists and its stored
    /// PIN equals the supplied one exactly (plain string equality - the
    /// store holds PINs in the clear). Unknown usernames are simply false.
    pub fn authenticate(&self, username: &str, pin: &str) -> bool {
        self.accounts
            .get(username)
            .is_some_and(|record| record.pin == pin)
    }

    /// Gets an account record, or returns an error if it doesn't exist.
    fn get(&self, username: &str) -> Result<&AccountRecord, Error> {
        self.accounts.get(username).ok_or(Error::AccountNotFound)
    }

    /// Reports the current balance. The administrator record tracks none,
    /// which surfaces as [`Error::BalanceNotTracked`].
    pub fn balance(&self, username: &str) -> Result<i64, Error> {
        self.get(username)?.balance.ok_or(Error::BalanceNotTracked)
    }

    /// Withdraws `amount` and returns the new balance. Validates, in order:
    /// the amount is positive, a multiple of 10, within the per-transaction
    /// cap, and covered by the current balance. On success the new balance
    /// is persisted before this returns.
    pub fn withdraw(&mut self, username: &str, amount: i64) -> Result<i64, Error> {
        let balance = self.balance(username)?;
        if amount <= 0 {
            return Err(Error::AmountMustBePositive);
        }
        if amount % 10 != 0 {
            return Err(Error::NotMultipleOfTen);
        }
        if amount > WITHDRAW_LIMIT {
            return Err(Error::WithdrawLimitExceeded);
        }
        if amount > balance {
            return Err(Error::InsufficientFunds);
        }

        let new_balance = balance - amount;
        self.set_balance(username, new_balance)?;
        info!(user = username, amount, balance = new_balance, "withdrawal applied");
        Ok(new_balance)
    }

    /// Deposits `amount` and returns the new balance, persisted before this
    /// returns. Only positive amounts are accepted; a deposit the balance
    /// cannot hold is rejected.
    pub fn deposit(&mut self, username: &str, amount: i64) -> Result<i64, Error> {
        let balance = self.balance(username)?;
        if amount <= 0 {
            return Err(Error::AmountMustBePositive);
        }

        let new_balance = balance
            .checked_add(amount)
            .ok_or(Error::BalanceLimitExceeded)?;
        self.set_balance(username, new_balance)?;
        info!(user = username, amount, balance = new_balance, "deposit applied");
        Ok(new_balance)
    }

    fn set_balance(&mut self, username: &str, new_balance: i64) -> Result<(), Error> {
        // Callers have already looked the record up; missing here means a bug.
        let record = self
            .accounts
            .get_mut(username)
            .ok_or(Error::AccountNotFound)?;
        record.balance = Some(new_balance);
        self.save()
    }

    /// Replaces the stored PIN. The new PIN must be exactly 4 digits; no
    /// confirmation of the old PIN is required because the session already
    /// authenticated.
    pub fn change_pin(&mut self, username: &str, new_pin: &str) -> Result<(), Error> {
        if !pin_is_valid(new_pin) {
            return Err(Error::InvalidPinFormat);
        }
        let record = self
            .accounts
            .get_mut(username)
            .ok_or(Error::AccountNotFound)?;
        record.pin = new_pin.to_string();
        self.save()?;
        info!(user = username, "PIN changed");
        Ok(())
    }

    /// Inserts a new account with a zero balance and persists. Rejects
    /// malformed PINs and usernames that already exist.
    pub fn add_user(&mut self, username: &str, pin: &str) -> Result<(), Error> {
        if !pin_is_valid(pin) {
            return Err(Error::InvalidPinFormat);
        }
        if self.accounts.contains_key(username) {
            return Err(Error::UserAlreadyExists);
        }
        self.accounts
            .insert(username.to_string(), AccountRecord::with_balance(pin, 0));
        self.save()?;
        info!(user = username, "user added");
        Ok(())
    }

    /// Removes an account and persists. The administrator account is
    /// protected; deleting an unknown username reports not-found.
    pub fn delete_user(&mut self, username: &str) -> Result<(), Error> {
        if username == ADMIN_USER {
            return Err(Error::AdminUndeletable);
        }
        if self.accounts.remove(username).is_none() {
            return Err(Error::AccountNotFound);
        }
        self.save()?;
        info!(user = username, "user deleted");
        Ok(())
    }

    /// All non-administrator accounts and their balances, sorted by username
    /// for deterministic listing order.
    pub fn balances(&self) -> Vec<(String, i64)> {
        let mut rows: Vec<(String, i64)> = self
            .accounts
            .iter()
            .filter(|(username, _)| username.as_str() != ADMIN_USER)
            .filter_map(|(username, record)| record.balance.map(|b| (username.clone(), b)))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    /// Seeds a fresh directory (default accounts) backed by a temp store.
    /// The `TempDir` must be kept alive for the duration of the test.
    fn seeded() -> (TempDir, PathBuf, Directory) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        let directory = Directory::load(JsonStore::new(&path)).unwrap();
        (dir, path, directory)
    }

    #[test]
    fn test_missing_store_seeds_defaults_and_persists_them() {
        let (_guard, path, directory) = seeded();

        assert_eq!(
            directory.balances(),
            vec![
                ("User1".to_string(), 1000),
                ("User2".to_string(), 2000),
                ("User3".to_string(), 3000),
            ]
        );
        // The defaults were written out immediately, not just held in memory.
        assert!(path.exists());
        let reloaded = Directory::load(JsonStore::new(&path)).unwrap();
        assert_eq!(reloaded.balances(), directory.balances());
    }

    #[test]
    fn test_existing_store_is_loaded_not_reseeded() {
        let (_guard, path, mut directory) = seeded();
        directory.add_user("Alice", "9999").unwrap();
        directory.withdraw("User1", 100).unwrap();

        let reloaded = Directory::load(JsonStore::new(&path)).unwrap();
        assert_eq!(reloaded.balance("Alice").unwrap(), 0);
        assert_eq!(reloaded.balance("User1").unwrap(), 900);
    }

    #[test]
    fn test_malformed_store_fails_to_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, "not a store").unwrap();

        let result = Directory::load(JsonStore::new(&path));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_authenticate_unknown_user_is_false_for_any_pin() {
        let (_guard, _, directory) = seeded();
        assert!(!directory.authenticate("Ghost", "1234"));
        assert!(!directory.authenticate("Ghost", "0000"));
        assert!(!directory.authenticate("", "1234"));
    }

    #[test]
    fn test_authenticate_requires_exact_pin() {
        let (_guard, _, directory) = seeded();
        assert!(directory.authenticate("User1", "1234"));
        assert!(!directory.authenticate("User1", "4321"));
        assert!(!directory.authenticate("User1", "1235"));
        assert!(!directory.authenticate("User1", "123"));
        assert!(!directory.authenticate("User1", "12345"));
        // The admin logs in the same way as everyone else.
        assert!(directory.authenticate(ADMIN_USER, "1357"));
    }

    #[test]
    fn test_withdraw_decrements_and_persists() {
        let (_guard, path, mut directory) = seeded();

        assert_eq!(directory.withdraw("User1", 50).unwrap(), 950);
        assert_eq!(directory.balance("User1").unwrap(), 950);

        let reloaded = Directory::load(JsonStore::new(&path)).unwrap();
        assert_eq!(reloaded.balance("User1").unwrap(), 950);
    }

    #[test]
    fn test_withdraw_at_the_cap_boundary() {
        let (_guard, _, mut directory) = seeded();
        assert_eq!(directory.withdraw("User1", 1000).unwrap(), 0);
    }

    #[test]
    fn test_withdraw_rejects_non_multiple_of_ten() {
        let (_guard, _, mut directory) = seeded();
        assert!(matches!(
            directory.withdraw("User1", 15),
            Err(Error::NotMultipleOfTen)
        ));
        assert_eq!(directory.balance("User1").unwrap(), 1000);
    }

    #[test]
    fn test_withdraw_rejects_amounts_over_the_cap() {
        let (_guard, _, mut directory) = seeded();
        assert!(matches!(
            directory.withdraw("User1", 1010),
            Err(Error::WithdrawLimitExceeded)
        ));
        assert_eq!(directory.balance("User1").unwrap(), 1000);
    }

    #[test]
    fn test_withdraw_rejects_more_than_the_balance() {
        let (_guard, _, mut directory) = seeded();

        // 2000 trips the cap before the balance comparison is ever reached;
        // either way the withdrawal must be rejected without mutating.
        assert!(directory.withdraw("User1", 2000).is_err());
        assert_eq!(directory.balance("User1").unwrap(), 1000);

        // Within the cap, the balance rule is what fires.
        directory.withdraw("User1", 50).unwrap();
        assert!(matches!(
            directory.withdraw("User1", 1000),
            Err(Error::InsufficientFunds)
        ));
        assert_eq!(directory.balance("User1").unwrap(), 950);
    }

    #[test]
    fn test_withdraw_rejects_non_positive_amounts() {
        let (_guard, _, mut directory) = seeded();
        assert!(matches!(
            directory.withdraw("User1", 0),
            Err(Error::AmountMustBePositive)
        ));
        assert!(matches!(
            directory.withdraw("User1", -10),
            Err(Error::AmountMustBePositive)
        ));
        assert_eq!(directory.balance("User1").unwrap(), 1000);
    }

    #[test]
    fn test_deposit_increments_and_persists() {
        let (_guard, path, mut directory) = seeded();

        assert_eq!(directory.deposit("User1", 500).unwrap(), 1500);

        let reloaded = Directory::load(JsonStore::new(&path)).unwrap();
        assert_eq!(reloaded.balance("User1").unwrap(), 1500);
    }

    #[test]
    fn test_deposit_rejects_overflowing_the_balance() {
        let (_guard, path, mut directory) = seeded();

        // Filling the balance right up to the integer limit is still valid.
        assert_eq!(
            directory.deposit("User1", i64::MAX - 1000).unwrap(),
            i64::MAX
        );

        assert!(matches!(
            directory.deposit("User1", 10),
            Err(Error::BalanceLimitExceeded)
        ));
        assert_eq!(directory.balance("User1").unwrap(), i64::MAX);

        let reloaded = Directory::load(JsonStore::new(&path)).unwrap();
        assert_eq!(reloaded.balance("User1").unwrap(), i64::MAX);
    }

    #[test]
    fn test_deposit_rejects_non_positive_amounts() {
        let (_guard, _, mut directory) = seeded();
        assert!(matches!(
            directory.deposit("User1", 0),
            Err(Error::AmountMustBePositive)
        ));
        assert!(matches!(
            directory.deposit("User1", -5),
            Err(Error::AmountMustBePositive)
        ));
        assert_eq!(directory.balance("User1").unwrap(), 1000);
    }

    #[test]
    fn test_change_pin_rotates_authentication() {
        let (_guard, path, mut directory) = seeded();

        directory.change_pin("User1", "4321").unwrap();
        assert!(directory.authenticate("User1", "4321"));
        assert!(!directory.authenticate("User1", "1234"));

        // And the rotation survives a reload.
        let reloaded = Directory::load(JsonStore::new(&path)).unwrap();
        assert!(reloaded.authenticate("User1", "4321"));
        assert!(!reloaded.authenticate("User1", "1234"));
    }

    #[test]
    fn test_change_pin_rejects_bad_formats() {
        let (_guard, _, mut directory) = seeded();
        for bad in ["123", "12345", "12a4", "", "abcd"] {
            assert!(matches!(
                directory.change_pin("User1", bad),
                Err(Error::InvalidPinFormat)
            ));
        }
        assert!(directory.authenticate("User1", "1234"));
    }

    #[test]
    fn test_add_then_delete_user() {
        let (_guard, _, mut directory) = seeded();

        directory.add_user("Alice", "9999").unwrap();
        assert!(directory.authenticate("Alice", "9999"));
        assert_eq!(directory.balance("Alice").unwrap(), 0);
        assert!(directory.balances().iter().any(|(name, _)| name == "Alice"));

        directory.delete_user("Alice").unwrap();
        assert!(!directory.authenticate("Alice", "9999"));
        assert!(matches!(
            directory.balance("Alice"),
            Err(Error::AccountNotFound)
        ));
        assert!(!directory.balances().iter().any(|(name, _)| name == "Alice"));
    }

    #[test]
    fn test_delete_unknown_user_reports_not_found() {
        let (_guard, _, mut directory) = seeded();
        let before = directory.balances();

        assert!(matches!(
            directory.delete_user("Ghost"),
            Err(Error::AccountNotFound)
        ));
        assert_eq!(directory.balances(), before);
    }

    #[test]
    fn test_add_user_rejects_existing_username() {
        let (_guard, _, mut directory) = seeded();

        assert!(matches!(
            directory.add_user("User1", "9999"),
            Err(Error::UserAlreadyExists)
        ));
        // The original record is untouched.
        assert_eq!(directory.balance("User1").unwrap(), 1000);
        assert!(directory.authenticate("User1", "1234"));
    }

    #[test]
    fn test_add_user_rejects_bad_pin() {
        let (_guard, _, mut directory) = seeded();
        assert!(matches!(
            directory.add_user("Alice", "99x9"),
            Err(Error::InvalidPinFormat)
        ));
        assert!(matches!(
            directory.balance("Alice"),
            Err(Error::AccountNotFound)
        ));
    }

    #[test]
    fn test_admin_cannot_be_deleted() {
        let (_guard, _, mut directory) = seeded();
        assert!(matches!(
            directory.delete_user(ADMIN_USER),
            Err(Error::AdminUndeletable)
        ));
        assert!(directory.authenticate(ADMIN_USER, "1357"));
    }

    #[test]
    fn test_admin_never_appears_in_balance_listings() {
        let (_guard, _, directory) = seeded();
        assert!(directory
            .balances()
            .iter()
            .all(|(username, _)| username != ADMIN_USER));
    }

    #[test]
    fn test_admin_balance_is_not_tracked() {
        let (_guard, _, directory) = seeded();
        assert!(matches!(
            directory.balance(ADMIN_USER),
            Err(Error::BalanceNotTracked)
        ));
    }

    #[test]
    fn test_balance_of_unknown_user_is_not_found() {
        let (_guard, _, directory) = seeded();
        assert!(matches!(
            directory.balance("Ghost"),
            Err(Error::AccountNotFound)
        ));
    }

    #[test]
    fn test_balances_are_sorted_by_username() {
        let (_guard, _, mut directory) = seeded();
        directory.add_user("Zed", "1111").unwrap();
        directory.add_user("Alice", "2222").unwrap();

        let names: Vec<String> = directory.balances().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["Alice", "User1", "User2", "User3", "Zed"]);
    }

    #[test]
    fn test_saving_a_freshly_loaded_directory_is_byte_identical() {
        let (_guard, path, _) = seeded();
        let before = fs::read(&path).unwrap();

        let directory = Directory::load(JsonStore::new(&path)).unwrap();
        directory.save().unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
