use anyhow::{Result, bail};
use autoreply_application::ReplyService;
use autoreply_core::reply::{ReplyMode, ReplyStore};

pub fn set(service: &ReplyService, text: &str) -> Result<()> {
    if let Err(reason) = ReplyStore::validate(text) {
        bail!("Reply not set: {}", reason);
    }
    match service.set_reply(text)? {
        Some(stored) => println!("Current reply set to: {}", stored),
        None => bail!("Reply not set"),
    }
    Ok(())
}

pub fn current(service: &ReplyService) {
    match service.reply() {
        Some(reply) => println!("{}", reply),
        None => println!("(no reply set, using default: {})", service.server_url()),
    }
}

pub fn history(service: &ReplyService) {
    let history = service.history();
    if history.is_empty() {
        println!("(history is empty)");
        return;
    }
    for (index, entry) in history.iter().enumerate() {
        println!("{:>2}. {}", index + 1, entry);
    }
}

pub fn mode(service: &ReplyService) {
    match service.reply_mode() {
        ReplyMode::LocalDefault { text } => println!("local: {}", text),
        ReplyMode::RemoteServer { url } => println!("remote: {}", url),
    }
}
