use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub directory_url: String,
    pub directory_token: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(directory_url: String) -> Self {
        Self {
            directory_url,
            directory_token: SecretString::default(),
        }
    }

    pub fn set_token(&mut self, token: SecretString) {
        self.directory_token = token;
    }
}
