mod epoch_provider;
pub(crate) use epoch_provider::EpochProvider;
