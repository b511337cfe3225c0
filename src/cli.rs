use std::io::Write;
use std::path::Path;
use tokio::io::AsyncReadExt;

use keyprotect::config::default_config_path;
use keyprotect::{Config, Credential, KeyClient, KeyPayload, KpError, Result, TokenManager};

use crate::{Cli, Commands, CreateArgs, DeleteArgs, GetArgs, UnwrapArgs, WrapArgs};

/// CLI handler for processing commands
pub struct CliHandler {
    config: Config,
    instance: Option<String>,
}

impl CliHandler {
    /// Build configuration from the default config file, environment, and
    /// command line overrides
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut builder = Config::builder().config_file(default_config_path());
        if let Some(region) = &cli.region {
            builder = builder.region(region);
        }
        if let Some(endpoint) = &cli.endpoint {
            builder = builder.endpoint(endpoint);
        }
        let config = builder.build()?;

        let instance = cli
            .instance
            .clone()
            .or_else(|| std::env::var("KP_INSTANCE_ID").ok().filter(|v| !v.is_empty()));

        Ok(Self { config, instance })
    }

    /// Execute a CLI command
    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Token => self.handle_token().await,
            Commands::List => self.handle_list().await,
            Commands::Get(args) => self.handle_get(args).await,
            Commands::Create(args) => self.handle_create(args).await,
            Commands::Delete(args) => self.handle_delete(args).await,
            Commands::Wrap(args) => self.handle_wrap(args).await,
            Commands::Unwrap(args) => self.handle_unwrap(args).await,
        }
    }

    /// Token manager with a credential from the environment or a prompt
    fn token_manager(&self) -> Result<TokenManager> {
        let mut manager = TokenManager::from_env(self.config.clone())?;
        if !manager.has_credential() {
            let api_key = dialoguer::Password::new()
                .with_prompt("API key")
                .interact()?;
            manager.set_credential(Credential::ApiKey(api_key));
        }
        Ok(manager)
    }

    async fn key_client(&self) -> Result<KeyClient> {
        let instance = self.instance.clone().ok_or_else(|| {
            KpError::invalid_input("no service instance id; pass --instance or set KP_INSTANCE_ID")
        })?;

        let mut tokens = self.token_manager()?;
        let token = tokens.token().await?;
        KeyClient::new(&self.config, token, instance)
    }

    async fn handle_token(&self) -> Result<()> {
        let mut tokens = self.token_manager()?;
        println!("{}", tokens.token().await?);
        Ok(())
    }

    async fn handle_list(&self) -> Result<()> {
        let client = self.key_client().await?;
        for key in client.list().await? {
            println!("{}\t{}", key.id.unwrap_or_default(), key.name);
        }
        Ok(())
    }

    async fn handle_get(&self, args: GetArgs) -> Result<()> {
        let client = self.key_client().await?;
        let key = client.get(&args.id).await?;
        println!("{}", serde_json::to_string_pretty(&key)?);
        Ok(())
    }

    async fn handle_create(&self, args: CreateArgs) -> Result<()> {
        let client = self.key_client().await?;

        let key = match &args.payload_file {
            Some(path) => {
                let material = read_file(path).await?;
                client
                    .create_with_payload(&args.name, args.root, KeyPayload::Raw(material))
                    .await?
            }
            None => client.create(&args.name, args.root).await?,
        };

        println!("Created key '{}'", key.id.unwrap_or_default());
        Ok(())
    }

    async fn handle_delete(&self, args: DeleteArgs) -> Result<()> {
        let client = self.key_client().await?;
        client.delete(&args.id).await?;
        println!("Deleted key '{}'", args.id);
        Ok(())
    }

    async fn handle_wrap(&self, args: WrapArgs) -> Result<()> {
        let plaintext = match &args.input {
            Some(path) => read_file(path).await?,
            None => {
                let mut buffer = Vec::new();
                tokio::io::stdin().read_to_end(&mut buffer).await?;
                buffer
            }
        };

        let client = self.key_client().await?;
        let aad = (!args.aad.is_empty()).then_some(args.aad.as_slice());
        let wrapped = client.wrap(&args.id, &plaintext, aad).await?;

        println!("{}", wrapped.ciphertext);
        Ok(())
    }

    async fn handle_unwrap(&self, args: UnwrapArgs) -> Result<()> {
        let client = self.key_client().await?;
        let aad = (!args.aad.is_empty()).then_some(args.aad.as_slice());
        let plaintext = client.unwrap(&args.id, &args.ciphertext, aad).await?;

        // plaintext is arbitrary bytes, write it unmodified
        let mut stdout = std::io::stdout();
        stdout.write_all(&plaintext)?;
        stdout.flush()?;
        Ok(())
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| KpError::io_from_error(format!("reading {}", path.display()), e))
}
