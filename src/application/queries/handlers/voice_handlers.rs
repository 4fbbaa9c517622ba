//! Voice Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::VoiceCatalogPort;
use crate::application::queries::{FindVoice, ListVoices};
use crate::domain::voice::VoiceDescriptor;

/// ListVoices Handler
pub struct ListVoicesHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl ListVoicesHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, query: ListVoices) -> Result<Vec<VoiceDescriptor>, ApplicationError> {
        let voices = self.catalog.get(query.platform, query.force_refresh).await?;

        Ok(match &query.locale {
            Some(locale) => voices
                .into_iter()
                .filter(|v| v.matches_locale(locale))
                .collect(),
            None => voices,
        })
    }
}

/// FindVoice Handler - 只查缓存，不触发拉取
pub struct FindVoiceHandler {
    catalog: Arc<dyn VoiceCatalogPort>,
}

impl FindVoiceHandler {
    pub fn new(catalog: Arc<dyn VoiceCatalogPort>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, query: FindVoice) -> Result<VoiceDescriptor, ApplicationError> {
        self.catalog
            .find_voice(query.platform, &query.name)
            .ok_or_else(|| ApplicationError::not_found("Voice", query.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CatalogError;
    use crate::domain::voice::Platform;
    use crate::infrastructure::adapters::StaticVoiceFetcher;
    use crate::infrastructure::memory::{VoiceCatalogCache, VoiceCatalogConfig};

    fn catalog() -> Arc<VoiceCatalogCache> {
        VoiceCatalogCache::new(
            VoiceCatalogConfig::default(),
            Arc::new(StaticVoiceFetcher::builtin()),
        )
        .arc()
    }

    #[tokio::test]
    async fn test_list_voices_with_locale_filter() {
        let handler = ListVoicesHandler::new(catalog());

        let all = handler.handle(ListVoices::new(Platform::Linux)).await.unwrap();
        assert_eq!(all.len(), 2);

        let english = handler
            .handle(ListVoices::new(Platform::Linux).with_locale("EN"))
            .await
            .unwrap();
        assert_eq!(english.len(), 1);
        assert_eq!(english[0].name, "linux-en-US");
    }

    #[tokio::test]
    async fn test_unsupported_platform_surfaces_catalog_error() {
        let catalog = VoiceCatalogCache::new(
            VoiceCatalogConfig::default(),
            Arc::new(StaticVoiceFetcher::new()),
        )
        .arc();
        let err = ListVoicesHandler::new(catalog)
            .handle(ListVoices::new(Platform::Ios))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::CatalogError(CatalogError::UnsupportedPlatform(Platform::Ios))
        ));
    }

    #[tokio::test]
    async fn test_find_voice_only_sees_cached_buckets() {
        let catalog = catalog();
        let finder = FindVoiceHandler::new(catalog.clone());
        let query = FindVoice {
            platform: Platform::Web,
            name: "WEB-EN-US".to_string(),
        };

        assert!(matches!(
            finder.handle(query.clone()),
            Err(ApplicationError::NotFound { .. })
        ));

        catalog.get(Platform::Web, false).await.unwrap();
        assert_eq!(finder.handle(query).unwrap().name, "web-en-US");
    }
}
