pub mod buy;
pub mod buy_and_sell;
pub mod bundle_status;
pub mod check;
pub mod gather;
pub mod sell;
pub mod top_up;
pub mod utils;
pub mod wallets;

pub use buy::{buy_token, BuyArgs};
pub use buy_and_sell::{buy_and_sell_token, BuyAndSellArgs};
pub use bundle_status::check_bundle_status;
pub use check::check_wallets;
pub use gather::gather_sol;
pub use sell::{sell_token, SellArgs};
pub use top_up::top_up_wallets;
pub use wallets::{generate_wallets, list_wallets};
