use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    deskset completions bash > /etc/bash_completion.d/deskset\n\n\
                  Generate zsh completions:\n    deskset completions zsh > ~/.zfunc/_deskset\n\n\
                  Generate fish completions:\n    deskset completions fish > ~/.config/fish/completions/deskset.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
