use {
    anyhow::Result,
    ron::ser::PrettyConfig,
    serde::{
        de::DeserializeOwned,
        Serialize,
    },
    std::{
        fs::File,
        io::Write,
        path::Path,
    },
};


/// Write any config to `path` as pretty RON.
pub fn write_config<C: Serialize, P: AsRef<Path>>(
    config: &C,
    path: P,
) -> Result<()> {
    let text = ron::ser::to_string_pretty(config, PrettyConfig::default())?;
    File::create(path)?.write_all(text.as_bytes())?;
    Ok(())
}

/// Read a config written by [`write_config`] (or by hand) from `path`.
pub fn read_config<C: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<C> {
    Ok(ron::de::from_reader(File::open(path)?)?)
}
