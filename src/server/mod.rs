mod server;

pub use server::*;

#[cfg(test)]
pub(crate) use server::tests::fake_settings;
