mod init;
mod token;

pub use init::cmd_init;
pub use token::{cmd_token_issue, cmd_token_list, cmd_token_revoke};
